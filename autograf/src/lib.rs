//! Event-driven Grafana dashboard provisioning.
//!
//! Autograf consumes Kubernetes namespace events from a Redis stream as a
//! consumer-group member and, for namespaces labeled with a dashboard
//! template, fetches the template from a GitHub repository, renders it with
//! namespace-derived values, creates the dashboard in Grafana, and announces
//! the result on a completion stream.
//!
//! Processing is at-least-once: a message is acknowledged only after the
//! whole pipeline succeeded, and unacknowledged messages are redelivered by
//! the stream.

pub mod concurrency;
pub mod error;
pub mod event;
mod macros;
pub mod orchestrator;
pub mod render;
pub mod sink;
pub mod stream;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
