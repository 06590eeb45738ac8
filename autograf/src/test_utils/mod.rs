//! In-memory collaborator doubles for testing the provisioning pipeline.
//!
//! Each double records the calls it receives and can be scripted to fail,
//! so acknowledgment semantics can be asserted without a stream store, a
//! template repository, or a dashboard server.

pub mod sink;
pub mod stream;
pub mod template;
