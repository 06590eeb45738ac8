//! Telemetry initialization for the Autograf services.
//!
//! Provides tracing setup with environment-aware output: structured JSON
//! logs to rolling files in production, pretty console logs in development.

pub mod tracing;
