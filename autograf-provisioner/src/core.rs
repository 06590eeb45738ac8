use autograf::orchestrator::Orchestrator;
use autograf::sink::{DashboardSink, GrafanaSink};
use autograf::stream::{EventStream, RedisStreamClient};
use autograf::template::{GitHubTemplateSource, TemplateSource};
use autograf_config::shared::{
    DashboardConfig, ProvisionerConfig, StreamConfig, TemplateSourceConfig,
};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

/// Starts the provisioner service with the provided configuration.
///
/// Connects to the stream store, wires the template source and dashboard
/// sink into an orchestrator, and runs it until a shutdown signal arrives.
pub async fn start_provisioner_with_config(
    provisioner_config: ProvisionerConfig,
) -> anyhow::Result<()> {
    info!("starting provisioner service");

    log_config(&provisioner_config);

    // The stream store is the only dependency checked up front: without it
    // the service can do nothing, so an unreachable store is fatal. The
    // template store and the sink are only validated by their first use.
    let stream = RedisStreamClient::connect(&provisioner_config.stream.addr).await?;
    info!("connected to the stream store");

    let templates = GitHubTemplateSource::new(provisioner_config.template_source)?;
    let sink = GrafanaSink::new(provisioner_config.dashboard)?;

    let orchestrator = Orchestrator::new(stream, templates, sink);
    run_orchestrator(orchestrator).await?;

    info!("provisioner service completed");

    Ok(())
}

fn log_config(config: &ProvisionerConfig) {
    log_stream_config(&config.stream);
    log_template_source_config(&config.template_source);
    log_dashboard_config(&config.dashboard);
}

fn log_stream_config(config: &StreamConfig) {
    debug!(addr = config.addr, "stream store config");
}

fn log_template_source_config(config: &TemplateSourceConfig) {
    debug!(
        owner = config.owner,
        repo = config.repo,
        branch = config.branch,
        template_path = config.template_path,
        "template source config"
    );
}

fn log_dashboard_config(config: &DashboardConfig) {
    debug!(base_url = config.base_url, "dashboard sink config");
}

/// Starts an orchestrator and handles graceful shutdown signals.
///
/// Launches the read loop, sets up signal handlers for SIGTERM and SIGINT,
/// and ensures the loop exits between messages. In-flight messages simply
/// stay unacknowledged and are redelivered later.
#[tracing::instrument(skip(orchestrator), fields(consumer = orchestrator.consumer_name()))]
async fn run_orchestrator<E, T, D>(orchestrator: Orchestrator<E, T, D>) -> anyhow::Result<()>
where
    E: EventStream + Send + Sync + 'static,
    T: TemplateSource + Send + Sync + 'static,
    D: DashboardSink + Send + Sync + 'static,
{
    // Create the consumer group before reading; an existing group is fine.
    orchestrator.start().await?;

    // Spawn a task to listen for shutdown signals and trigger shutdown.
    let shutdown_tx = orchestrator.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        // Listen for SIGTERM, sent by Kubernetes before SIGKILL during pod
        // termination.
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, shutting down the orchestrator");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down the orchestrator");
            }
        }

        if let Err(e) = shutdown_tx.shutdown() {
            warn!("failed to send shutdown signal: {:?}", e);
        }
    });

    // Wait for the read loop to finish (only happens via shutdown).
    let result = orchestrator.run().await;

    // Ensure the shutdown task is finished before returning. If the loop
    // ended for another reason, the signal listener is still pending and
    // must be aborted.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    // Propagate any orchestrator error as anyhow error.
    result?;

    Ok(())
}
