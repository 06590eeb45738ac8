//! Configuration management for the Autograf services.
//!
//! Provides environment detection, layered configuration loading from YAML
//! files and environment variables, secret handling, and the shared
//! configuration types consumed by the provisioner.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
