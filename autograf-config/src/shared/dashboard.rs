use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Configuration for the Grafana instance receiving provisioned dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardConfig {
    /// Home page URL of the Grafana server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// REST API token for the Grafana server. Sensitive and redacted in debug
    /// output.
    pub api_token: SerializableSecretString,
}

impl DashboardConfig {
    /// Validates the [`DashboardConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::InvalidDashboard(
                "`base_url` cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidDashboard(
                "`base_url` must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_scheme_is_required() {
        let config = DashboardConfig {
            base_url: "grafana:3000".to_string(),
            api_token: SerializableSecretString::from(""),
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            base_url: default_base_url(),
            api_token: SerializableSecretString::from(""),
        };
        assert!(config.validate().is_ok());
    }
}
