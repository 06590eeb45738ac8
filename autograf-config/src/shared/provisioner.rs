use serde::{Deserialize, Serialize};

use crate::shared::{DashboardConfig, StreamConfig, TemplateSourceConfig, ValidationError};

/// Configuration for the provisioner service.
///
/// Aggregates everything the service needs: the stream store to consume
/// namespace events from, the template store to fetch dashboard templates
/// from, and the Grafana instance to provision dashboards into.
///
/// The [`ProvisionerConfig`] is deserialized from the configuration files at
/// startup and passed into the orchestrator by reference, never read from
/// ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvisionerConfig {
    /// Configuration for the Redis stream store.
    pub stream: StreamConfig,
    /// Configuration for the dashboard template store.
    pub template_source: TemplateSourceConfig,
    /// Configuration for the dashboard sink.
    pub dashboard: DashboardConfig,
}

impl ProvisionerConfig {
    /// Validates the loaded [`ProvisionerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if any section fails validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.stream.validate()?;
        self.template_source.validate()?;
        self.dashboard.validate()?;

        Ok(())
    }
}
