#![cfg(feature = "test-utils")]

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};

use autograf::event::{K8S_OBJECT_FIELD, NAMESPACE_ADDED_EVENT, WHAT_HAPPENED_FIELD};
use autograf::orchestrator::{
    DASHBOARD_CREATED_EVENT, FILENAME_FIELD, Orchestrator, PAYLOAD_FIELD,
};
use autograf::stream::{
    DASHBOARDS_STREAM, KUBERNETES_CONSUMER_GROUP, KUBERNETES_STREAM, StreamMessage,
};
use autograf::test_utils::sink::MemoryDashboardSink;
use autograf::test_utils::stream::MemoryEventStream;
use autograf::test_utils::template::MemoryTemplateSource;
use autograf_telemetry::tracing::init_test_tracing;

const TEMPLATE: &str = r#"{"title": "{{title}}", "tags": ["{{namespace}}"]}"#;

fn namespace_added_message(id: &str, payload: Value) -> StreamMessage {
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

fn team_payload(name: &str, title: &str) -> Value {
    json!({
        "metadata": {
            "name": name,
            "labels": {
                "grafana-template": "service-overview",
                "grafana-dashboard-name": title
            }
        }
    })
}

/// Waits until the stream double has acknowledged `count` messages.
async fn wait_for_acks(stream: &MemoryEventStream, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if stream.acked().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for acknowledgments");
}

#[tokio::test(flavor = "multi_thread")]
async fn start_creates_the_consumer_group_idempotently() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let orchestrator = Orchestrator::new(
        stream.clone(),
        MemoryTemplateSource::new(),
        MemoryDashboardSink::new(),
    );

    orchestrator.start().await.unwrap();
    // A second start must be a no-op, like a restarted consumer joining an
    // existing group.
    orchestrator.start().await.unwrap();

    assert_eq!(
        stream.groups().await,
        vec![(
            KUBERNETES_STREAM.to_string(),
            KUBERNETES_CONSUMER_GROUP.to_string()
        )]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn consumer_names_are_unique_per_orchestrator() {
    let first = Orchestrator::new(
        MemoryEventStream::new(),
        MemoryTemplateSource::new(),
        MemoryDashboardSink::new(),
    );
    let second = Orchestrator::new(
        MemoryEventStream::new(),
        MemoryTemplateSource::new(),
        MemoryDashboardSink::new(),
    );

    assert_ne!(first.consumer_name(), second.consumer_name());
    assert!(first.consumer_name().starts_with("provisioner-"));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_provisions_and_acknowledges_labeled_namespaces() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let templates = MemoryTemplateSource::new();
    templates
        .insert("service-overview", TEMPLATE.as_bytes().to_vec())
        .await;
    let sink = MemoryDashboardSink::new();

    stream
        .push(namespace_added_message("1-0", team_payload("team-a", "Team A")))
        .await;

    let orchestrator = Orchestrator::new(stream.clone(), templates, sink.clone());
    orchestrator.start().await.unwrap();

    let shutdown_tx = orchestrator.shutdown_tx();
    let run_handle = tokio::spawn(orchestrator.run());

    wait_for_acks(&stream, 1).await;
    shutdown_tx.shutdown().unwrap();
    run_handle.await.unwrap().unwrap();

    // The dashboard was created from the rendered template.
    let created = sink.created().await;
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0].dashboard,
        json!({"title": "Team A", "tags": ["team-a"]})
    );

    // The outcome event announces the stored dashboard.
    let appended = stream.appended().await;
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0, DASHBOARDS_STREAM);

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

    assert_eq!(stream.acked().await, vec!["1-0".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_processes_messages_in_delivery_order() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let templates = MemoryTemplateSource::new();
    templates
        .insert("service-overview", TEMPLATE.as_bytes().to_vec())
        .await;
    let sink = MemoryDashboardSink::new();

    stream
        .push(namespace_added_message("1-0", team_payload("team-a", "Team A")))
        .await;
    stream
        .push(namespace_added_message("2-0", team_payload("team-b", "Team B")))
        .await;

    let orchestrator = Orchestrator::new(stream.clone(), templates, sink.clone());
    let shutdown_tx = orchestrator.shutdown_tx();
    let run_handle = tokio::spawn(orchestrator.run());

    wait_for_acks(&stream, 2).await;
    shutdown_tx.shutdown().unwrap();
    run_handle.await.unwrap().unwrap();

    assert_eq!(
        stream.acked().await,
        vec!["1-0".to_string(), "2-0".to_string()]
    );

    let created = sink.created().await;
    assert_eq!(created[0].dashboard["title"], "Team A");
    assert_eq!(created[1].dashboard["title"], "Team B");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_create_produces_no_outcome_and_no_ack() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let templates = MemoryTemplateSource::new();
    templates
        .insert("service-overview", TEMPLATE.as_bytes().to_vec())
        .await;
    let sink = MemoryDashboardSink::new();
    sink.reject_creates(true).await;

    let orchestrator = Orchestrator::new(stream.clone(), templates, sink.clone());
    orchestrator
        .process_message(&namespace_added_message("1-0", team_payload("team-a", "Team A")))
        .await;

    assert!(stream.appended().await.is_empty());
    // Unacknowledged: the message stays eligible for redelivery to any
    // consumer in the group.
    assert!(stream.acked().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unlabeled_namespace_causes_no_external_calls() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let templates = MemoryTemplateSource::new();
    let sink = MemoryDashboardSink::new();

    let orchestrator = Orchestrator::new(stream.clone(), templates.clone(), sink.clone());
    let payload = json!({"metadata": {"name": "team-a", "labels": {"team": "a"}}});
    orchestrator
        .process_message(&namespace_added_message("1-0", payload))
        .await;

    assert!(templates.fetched().await.is_empty());
    assert!(sink.created().await.is_empty());
    assert!(stream.appended().await.is_empty());
    assert!(stream.acked().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_template_fails_the_pipeline_immediately() {
    init_test_tracing();

    let stream = MemoryEventStream::new();
    let templates = MemoryTemplateSource::new();
    let sink = MemoryDashboardSink::new();

    let orchestrator = Orchestrator::new(stream.clone(), templates.clone(), sink.clone());
    orchestrator
        .process_message(&namespace_added_message("1-0", team_payload("team-a", "Team A")))
        .await;

    // The fetch was attempted, nothing after it was.
    assert_eq!(templates.fetched().await, vec!["service-overview"]);
    assert!(sink.created().await.is_empty());
    assert!(stream.appended().await.is_empty());
    assert!(stream.acked().await.is_empty());
}
