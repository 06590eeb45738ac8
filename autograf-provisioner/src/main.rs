use autograf_config::shared::ProvisionerConfig;
use autograf_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_provisioner_config;
use crate::core::start_provisioner_with_config;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    // Load the config before anything else so a broken deployment fails
    // immediately.
    let provisioner_config = load_provisioner_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(provisioner_config))?;

    Ok(())
}

async fn async_main(provisioner_config: ProvisionerConfig) -> anyhow::Result<()> {
    // We start the provisioner and catch any errors.
    if let Err(err) = start_provisioner_with_config(provisioner_config).await {
        error!("an error occurred in the provisioner: {err}");

        return Err(err);
    }

    Ok(())
}
