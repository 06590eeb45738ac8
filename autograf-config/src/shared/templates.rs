use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

fn default_branch() -> String {
    "master".to_string()
}

fn default_template_path() -> String {
    "/templates".to_string()
}

/// Configuration for the GitHub-backed dashboard template store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TemplateSourceConfig {
    /// Owner of the repository holding the templates.
    pub owner: String,
    /// Repository holding the templates.
    pub repo: String,
    /// Branch from which templates are read.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Path inside the repository where templates are stored.
    #[serde(default = "default_template_path")]
    pub template_path: String,
    /// Personal access token for the repository. Sensitive and redacted in
    /// debug output.
    pub access_token: SerializableSecretString,
}

impl TemplateSourceConfig {
    /// Validates the [`TemplateSourceConfig`].
    ///
    /// Only presence is checked; whether the repository actually exists is
    /// discovered by the first template fetch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner.is_empty() {
            return Err(ValidationError::InvalidTemplateSource(
                "`owner` cannot be empty".to_string(),
            ));
        }

        if self.repo.is_empty() {
            return Err(ValidationError::InvalidTemplateSource(
                "`repo` cannot be empty".to_string(),
            ));
        }

        if self.branch.is_empty() {
            return Err(ValidationError::InvalidTemplateSource(
                "`branch` cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> TemplateSourceConfig {
        TemplateSourceConfig {
            owner: "acme".to_string(),
            repo: "dashboards".to_string(),
            branch: default_branch(),
            template_path: default_template_path(),
            access_token: SerializableSecretString::from("token"),
        }
    }

    #[test]
    fn complete_config_is_valid() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn missing_owner_or_repo_is_rejected() {
        let mut config = sample_config();
        config.owner = String::new();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.repo = String::new();
        assert!(config.validate().is_err());
    }
}
