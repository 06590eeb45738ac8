//! Event stream access.
//!
//! The stream store owns message durability and delivery: each message is
//! delivered to exactly one member of a consumer group at a time and stays
//! eligible for redelivery until explicitly acknowledged.

mod client;

pub use client::RedisStreamClient;

use std::collections::HashMap;
use std::future::Future;

use crate::error::AutografResult;

/// Inbound stream carrying Kubernetes watch events.
pub const KUBERNETES_STREAM: &str = "kubernetes";

/// Consumer group competing over the inbound stream.
pub const KUBERNETES_CONSUMER_GROUP: &str = "kubernetes-consumer-group";

/// Outbound stream announcing provisioned dashboards.
pub const DASHBOARDS_STREAM: &str = "dashboards";

/// One delivered stream entry: a stable identifier plus a field mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Stream-assigned identifier, used for acknowledgment.
    pub id: String,
    /// Field mapping carried by the entry.
    pub fields: HashMap<String, String>,
}

impl StreamMessage {
    /// Returns the value of the named field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Consumer-group access to the event stream store.
///
/// Pass-through semantics: no retry or backoff logic lives behind this trait.
pub trait EventStream {
    /// Creates a consumer group on a stream.
    ///
    /// Idempotent: a group that already exists is not an error.
    fn create_group(
        &self,
        stream: &str,
        group: &str,
    ) -> impl Future<Output = AutografResult<()>> + Send;

    /// Reads messages assigned to this consumer, blocking until at least one
    /// is available.
    fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> impl Future<Output = AutografResult<Vec<StreamMessage>>> + Send;

    /// Acknowledges a delivered message, retiring it from the group.
    fn ack(
        &self,
        stream: &str,
        group: &str,
        message_id: &str,
    ) -> impl Future<Output = AutografResult<()>> + Send;

    /// Appends a message to a stream, returning the assigned identifier.
    fn append(
        &self,
        stream: &str,
        fields: Vec<(String, Vec<u8>)>,
    ) -> impl Future<Output = AutografResult<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_returns_present_fields_only() {
        let message = StreamMessage {
            id: "1-0".to_string(),
            fields: HashMap::from([("whatHappened".to_string(), "namespace added".to_string())]),
        };

        assert_eq!(message.field("whatHappened"), Some("namespace added"));
        assert_eq!(message.field("k8sObject"), None);
    }
}
