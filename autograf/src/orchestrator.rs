//! Core provisioning orchestration.
//!
//! Contains the [`Orchestrator`] that drives the end-to-end pipeline per
//! inbound event: read from the consumer group, filter, fetch the template,
//! render it, create the dashboard, announce the outcome, and acknowledge
//! the origin message only when the whole pipeline succeeded.
//!
//! There is no atomic commit across the three external systems. Any failure
//! up to and including dashboard creation leaves the message unacknowledged
//! so the stream redelivers it; failures after creation are logged and
//! swallowed, since the dashboard already exists and re-provisioning is
//! idempotent.

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::error::AutografResult;
use crate::event::{
    DASHBOARD_NAME_LABEL, K8S_OBJECT_FIELD, NAMESPACE_ADDED_EVENT, TEMPLATE_LABEL,
    WHAT_HAPPENED_FIELD, decode_namespace, namespace_name, non_empty_label,
};
use crate::render::{RenderContext, render_dashboard};
use crate::sink::{DashboardRequest, DashboardSink};
use crate::stream::{
    DASHBOARDS_STREAM, EventStream, KUBERNETES_CONSUMER_GROUP, KUBERNETES_STREAM, StreamMessage,
};
use crate::template::TemplateSource;

/// Event description attached to outcome events for created dashboards.
pub const DASHBOARD_CREATED_EVENT: &str = "dashboard created";

/// Outcome field carrying the dashboard file name.
pub const FILENAME_FIELD: &str = "filename";

/// Outcome field carrying the JSON bytes of the stored dashboard.
pub const PAYLOAD_FIELD: &str = "payload";

/// Completion event appended to the outbound stream after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningOutcome {
    /// Event description, [`DASHBOARD_CREATED_EVENT`].
    pub what_happened: String,
    /// File name derived from the dashboard title.
    pub filename: String,
    /// JSON bytes of the stored dashboard definition.
    pub payload: Vec<u8>,
}

impl ProvisioningOutcome {
    /// Converts the outcome into the field mapping appended to the stream.
    pub fn into_fields(self) -> Vec<(String, Vec<u8>)> {
        vec![
            (
                WHAT_HAPPENED_FIELD.to_string(),
                self.what_happened.into_bytes(),
            ),
            (FILENAME_FIELD.to_string(), self.filename.into_bytes()),
            (PAYLOAD_FIELD.to_string(), self.payload),
        ]
    }
}

/// Orchestrates dashboard provisioning over its three collaborators.
///
/// Generic over the event stream, template source, and dashboard sink so
/// that multiple backends (and test doubles) plug in without changing the
/// processing semantics.
#[derive(Debug)]
pub struct Orchestrator<E, T, D> {
    stream: E,
    templates: T,
    sink: D,
    consumer_name: String,
    shutdown_tx: ShutdownTx,
    shutdown_rx: ShutdownRx,
}

impl<E, T, D> Orchestrator<E, T, D>
where
    E: EventStream + Send + Sync,
    T: TemplateSource + Send + Sync,
    D: DashboardSink + Send + Sync,
{
    /// Creates an orchestrator over the given collaborators.
    ///
    /// Each orchestrator joins the consumer group under a freshly generated
    /// unique consumer name, so multiple instances compete for messages
    /// without manual identity coordination.
    pub fn new(stream: E, templates: T, sink: D) -> Self {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        Self {
            stream,
            templates,
            sink,
            consumer_name: format!("provisioner-{}", Uuid::new_v4()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Returns the unique consumer name of this orchestrator.
    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Returns a handle for sending shutdown signals to this orchestrator.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Ensures the consumer group exists on the inbound stream.
    ///
    /// Group creation is idempotent: a group surviving a previous run is
    /// logged by the stream client and ignored.
    pub async fn start(&self) -> AutografResult<()> {
        info!(
            stream = KUBERNETES_STREAM,
            group = KUBERNETES_CONSUMER_GROUP,
            consumer = self.consumer_name,
            "joining consumer group"
        );

        self.stream
            .create_group(KUBERNETES_STREAM, KUBERNETES_CONSUMER_GROUP)
            .await
    }

    /// Runs the read loop until shutdown is signaled.
    ///
    /// Each iteration blocks until at least one message is assigned to this
    /// consumer; messages are processed strictly in delivery order. Read
    /// failures are logged and the loop continues, per the rule that no
    /// steady-state failure terminates the process.
    pub async fn run(self) -> AutografResult<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("shutdown signal received, stopping the orchestrator");
                    return Ok(());
                }
                read = self.stream.read_group(
                    KUBERNETES_STREAM,
                    KUBERNETES_CONSUMER_GROUP,
                    &self.consumer_name,
                ) => {
                    match read {
                        Ok(messages) => {
                            for message in messages {
                                self.process_message(&message).await;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "failed to read from the stream");
                        }
                    }
                }
            }
        }
    }

    /// Processes one inbound message, acknowledging it only when the
    /// provisioning pipeline reports success.
    ///
    /// Every other path leaves the message unacknowledged: skipped event
    /// kinds, undecodable payloads, namespaces without the template label,
    /// and pipeline failures all rely on the stream's redelivery contract.
    pub async fn process_message(&self, message: &StreamMessage) {
        let Some(what_happened) = message.field(WHAT_HAPPENED_FIELD) else {
            debug!(message_id = message.id, "message carries no event description, skipping");
            return;
        };

        if what_happened != NAMESPACE_ADDED_EVENT {
            debug!(
                message_id = message.id,
                what_happened, "event is not a namespace addition, skipping"
            );
            return;
        }

        let Some(payload) = message.field(K8S_OBJECT_FIELD) else {
            debug!(message_id = message.id, "message carries no namespace payload, skipping");
            return;
        };

        let namespace = match decode_namespace(payload) {
            Ok(namespace) => namespace,
            Err(err) => {
                warn!(
                    message_id = message.id,
                    error = %err,
                    "failed to decode the namespace payload, leaving the message for redelivery"
                );
                return;
            }
        };

        let Some(template_name) = non_empty_label(&namespace, TEMPLATE_LABEL) else {
            debug!(
                namespace = namespace_name(&namespace),
                "namespace requests no dashboard template, nothing to do"
            );
            return;
        };

        let context = RenderContext {
            title: non_empty_label(&namespace, DASHBOARD_NAME_LABEL)
                .unwrap_or_default()
                .to_string(),
            namespace: namespace_name(&namespace).to_string(),
        };

        match self.provision_dashboard(template_name, &context).await {
            Ok(()) => {
                if let Err(err) = self
                    .stream
                    .ack(KUBERNETES_STREAM, KUBERNETES_CONSUMER_GROUP, &message.id)
                    .await
                {
                    warn!(
                        message_id = message.id,
                        error = %err,
                        "failed to acknowledge the processed message"
                    );
                }
            }
            Err(err) => {
                warn!(
                    message_id = message.id,
                    template = template_name,
                    namespace = context.namespace,
                    error = %err,
                    "dashboard provisioning failed, leaving the message for redelivery"
                );
            }
        }
    }

    /// Runs the fetch → render → create → announce pipeline for one
    /// namespace.
    ///
    /// The pipeline fails fast on the first error up to dashboard creation.
    /// A render failure aborts before anything is sent to the sink, so a
    /// broken template can never produce a dashboard from partial content.
    async fn provision_dashboard(
        &self,
        template_name: &str,
        context: &RenderContext,
    ) -> AutografResult<()> {
        debug!(
            template = template_name,
            namespace = context.namespace,
            "fetching dashboard template"
        );
        let raw = self.templates.fetch(template_name).await?;
        let template = String::from_utf8(raw)?;

        let rendered = render_dashboard(&template, context)?;
        let dashboard: Value = serde_json::from_str(&rendered)?;

        let created = self.sink.create(DashboardRequest::new(dashboard)).await?;
        info!(
            uid = created.uid,
            namespace = context.namespace,
            "dashboard created"
        );

        self.announce_dashboard(&created.uid, &context.title).await;

        Ok(())
    }

    /// Publishes the provisioning outcome for a created dashboard.
    ///
    /// Best effort: the dashboard already exists, so neither a failed
    /// confirmatory read nor a failed append undoes it or fails the
    /// pipeline. A lost outcome event has no redelivery path.
    async fn announce_dashboard(&self, uid: &str, title: &str) {
        let definition = match self.sink.fetch_dashboard(uid).await {
            Ok(definition) => definition,
            Err(err) => {
                warn!(
                    uid,
                    error = %err,
                    "failed to read back the created dashboard, skipping the outcome event"
                );
                return;
            }
        };

        let payload = match serde_json::to_vec(&definition) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    uid,
                    error = %err,
                    "failed to serialize the stored dashboard, skipping the outcome event"
                );
                return;
            }
        };

        let outcome = ProvisioningOutcome {
            what_happened: DASHBOARD_CREATED_EVENT.to_string(),
            filename: format!("{title}.json"),
            payload,
        };

        match self
            .stream
            .append(DASHBOARDS_STREAM, outcome.into_fields())
            .await
        {
            Ok(message_id) => debug!(message_id, uid, "outcome event published"),
            Err(err) => {
                warn!(uid, error = %err, "failed to publish the outcome event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use serde_json::json;

    use crate::test_utils::sink::MemoryDashboardSink;
    use crate::test_utils::stream::MemoryEventStream;
    use crate::test_utils::template::MemoryTemplateSource;

    const TEMPLATE: &str = r#"{"title": "{{title}}", "tags": ["{{namespace}}"]}"#;

    fn namespace_added_message(id: &str, payload: &str) -> StreamMessage {
        StreamMessage {
            id: id.to_string(),
            fields: HashMap::from([
                (
                    WHAT_HAPPENED_FIELD.to_string(),
                    NAMESPACE_ADDED_EVENT.to_string(),
                ),
                (K8S_OBJECT_FIELD.to_string(), payload.to_string()),
            ]),
        }
    }

    fn team_a_payload() -> String {
        json!({
            "metadata": {
                "name": "team-a",
                "labels": {
                    "grafana-template": "service-overview",
                    "grafana-dashboard-name": "Team A"
                }
            }
        })
        .to_string()
    }

    fn orchestrator_with(
        templates: MemoryTemplateSource,
        sink: MemoryDashboardSink,
    ) -> (
        Orchestrator<MemoryEventStream, MemoryTemplateSource, MemoryDashboardSink>,
        MemoryEventStream,
    ) {
        let stream = MemoryEventStream::new();
        let orchestrator = Orchestrator::new(stream.clone(), templates, sink);

        (orchestrator, stream)
    }

    #[tokio::test]
    async fn namespace_with_template_label_is_provisioned_and_acked() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        let created = sink.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(
            created[0].dashboard,
            json!({"title": "Team A", "tags": ["team-a"]})
        );
        assert!(created[0].overwrite);

        let appended = stream.appended().await;
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, DASHBOARDS_STREAM);

        assert_eq!(stream.acked().await, vec!["1-0".to_string()]);
    }

    #[tokio::test]
    async fn outcome_event_carries_the_stored_dashboard() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        let appended = stream.appended().await;
        let fields: HashMap<String, Vec<u8>> = appended[0].1.clone().into_iter().collect();

        assert_eq!(
            fields[WHAT_HAPPENED_FIELD],
            DASHBOARD_CREATED_EVENT.as_bytes()
        );
        assert_eq!(fields[FILENAME_FIELD], b"Team A.json");

        let payload: Value = serde_json::from_slice(&fields[PAYLOAD_FIELD]).unwrap();
        assert_eq!(
            payload["dashboard"],
            json!({"title": "Team A", "tags": ["team-a"]})
        );
    }

    #[tokio::test]
    async fn other_event_kinds_are_skipped_without_side_effects() {
        let templates = MemoryTemplateSource::new();
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates.clone(), sink.clone());

        let message = StreamMessage {
            id: "1-0".to_string(),
            fields: HashMap::from([
                (
                    WHAT_HAPPENED_FIELD.to_string(),
                    "namespace deleted".to_string(),
                ),
                (K8S_OBJECT_FIELD.to_string(), team_a_payload()),
            ]),
        };
        orchestrator.process_message(&message).await;

        assert!(templates.fetched().await.is_empty());
        assert!(sink.created().await.is_empty());
        assert!(stream.appended().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn namespace_without_template_label_causes_no_external_calls() {
        let templates = MemoryTemplateSource::new();
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates.clone(), sink.clone());

        let payload = json!({"metadata": {"name": "team-b", "labels": {}}}).to_string();
        orchestrator
            .process_message(&namespace_added_message("1-0", &payload))
            .await;

        assert!(templates.fetched().await.is_empty());
        assert!(sink.created().await.is_empty());
        assert!(stream.appended().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn undecodable_payload_is_left_unacknowledged() {
        let templates = MemoryTemplateSource::new();
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", "not json"))
            .await;

        assert!(sink.created().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn rejected_create_leaves_the_message_unacknowledged() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        sink.reject_creates(true).await;
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        assert!(stream.appended().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn missing_template_fails_before_render_and_create() {
        let templates = MemoryTemplateSource::new();
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates.clone(), sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        assert_eq!(templates.fetched().await, vec!["service-overview"]);
        assert!(sink.created().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn broken_template_aborts_before_the_sink() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", b"{\"title\": \"{{titel}}\"}".to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        assert!(sink.created().await.is_empty());
        assert!(stream.acked().await.is_empty());
    }

    #[tokio::test]
    async fn failed_outcome_publish_still_acknowledges() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());
        stream.fail_appends(true).await;

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        assert_eq!(sink.created().await.len(), 1);
        assert_eq!(stream.acked().await, vec!["1-0".to_string()]);
    }

    #[tokio::test]
    async fn failed_confirmatory_read_skips_the_outcome_but_still_acknowledges() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        sink.fail_fetches(true).await;
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        orchestrator
            .process_message(&namespace_added_message("1-0", &team_a_payload()))
            .await;

        assert_eq!(sink.created().await.len(), 1);
        assert!(stream.appended().await.is_empty());
        assert_eq!(stream.acked().await, vec!["1-0".to_string()]);
    }

    #[tokio::test]
    async fn missing_title_label_provisions_with_an_empty_title() {
        let templates = MemoryTemplateSource::new();
        templates
            .insert("service-overview", TEMPLATE.as_bytes().to_vec())
            .await;
        let sink = MemoryDashboardSink::new();
        let (orchestrator, stream) = orchestrator_with(templates, sink.clone());

        let payload = json!({
            "metadata": {
                "name": "team-c",
                "labels": {"grafana-template": "service-overview"}
            }
        })
        .to_string();
        orchestrator
            .process_message(&namespace_added_message("1-0", &payload))
            .await;

        let created = sink.created().await;
        assert_eq!(
            created[0].dashboard,
            json!({"title": "", "tags": ["team-c"]})
        );

        let appended = stream.appended().await;
        let fields: HashMap<String, Vec<u8>> = appended[0].1.clone().into_iter().collect();
        assert_eq!(fields[FILENAME_FIELD], b".json");
    }
}
