use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::stream::{EventStream, StreamMessage};

#[derive(Debug, Default)]
struct Inner {
    pending: VecDeque<StreamMessage>,
    groups: Vec<(String, String)>,
    acked: Vec<String>,
    appended: Vec<(String, Vec<(String, Vec<u8>)>)>,
    fail_appends: bool,
}

/// In-memory [`EventStream`] double.
///
/// Unlike the real client, reads never block: a read drains whatever is
/// queued and returns immediately, so tests drive the orchestrator one
/// message at a time.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStream {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an inbound message for the next read.
    pub async fn push(&self, message: StreamMessage) {
        let mut inner = self.inner.lock().await;
        inner.pending.push_back(message);
    }

    /// Makes subsequent appends fail.
    pub async fn fail_appends(&self, fail: bool) {
        let mut inner = self.inner.lock().await;
        inner.fail_appends = fail;
    }

    /// Returns the created consumer groups as `(stream, group)` pairs.
    pub async fn groups(&self) -> Vec<(String, String)> {
        let inner = self.inner.lock().await;
        inner.groups.clone()
    }

    /// Returns the ids of acknowledged messages, in order.
    pub async fn acked(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.acked.clone()
    }

    /// Returns the appended messages as `(stream, fields)` pairs, in order.
    pub async fn appended(&self) -> Vec<(String, Vec<(String, Vec<u8>)>)> {
        let inner = self.inner.lock().await;
        inner.appended.clone()
    }
}

impl EventStream for MemoryEventStream {
    async fn create_group(&self, stream: &str, group: &str) -> AutografResult<()> {
        let mut inner = self.inner.lock().await;
        // Re-creating an existing group is a no-op, like BUSYGROUP handling
        // in the real client.
        let entry = (stream.to_string(), group.to_string());
        if !inner.groups.contains(&entry) {
            inner.groups.push(entry);
        }

        Ok(())
    }

    async fn read_group(
        &self,
        _stream: &str,
        _group: &str,
        _consumer: &str,
    ) -> AutografResult<Vec<StreamMessage>> {
        let mut inner = self.inner.lock().await;

        Ok(inner.pending.drain(..).collect())
    }

    async fn ack(&self, _stream: &str, _group: &str, message_id: &str) -> AutografResult<()> {
        let mut inner = self.inner.lock().await;
        inner.acked.push(message_id.to_string());

        Ok(())
    }

    async fn append(&self, stream: &str, fields: Vec<(String, Vec<u8>)>) -> AutografResult<String> {
        let mut inner = self.inner.lock().await;
        if inner.fail_appends {
            bail!(
                ErrorKind::StreamPublishFailed,
                "append failure scripted by the test"
            );
        }

        inner.appended.push((stream.to_string(), fields));

        Ok(format!("{}-0", inner.appended.len()))
    }
}
