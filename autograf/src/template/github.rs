use autograf_config::shared::TemplateSourceConfig;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::template::{TemplateSource, template_file_path};
use crate::{autograf_error, bail};

/// Base URL of the GitHub REST API.
const GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// Media type asking the contents API for the raw file body instead of the
/// base64-wrapped JSON envelope.
const RAW_CONTENT_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// GitHub-repository-backed [`TemplateSource`].
///
/// Fetches template files through the contents API of the configured
/// repository and branch.
#[derive(Debug, Clone)]
pub struct GitHubTemplateSource {
    client: reqwest::Client,
    config: TemplateSourceConfig,
}

impl GitHubTemplateSource {
    /// Creates a template source over the given repository configuration.
    pub fn new(config: TemplateSourceConfig) -> AutografResult<Self> {
        // GitHub rejects requests without a user agent.
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::ConfigError,
                    "failed to construct the template store HTTP client",
                    err
                )
            })?;

        Ok(Self { client, config })
    }

    /// Builds the contents API URL for a named template.
    fn contents_url(&self, template_name: &str) -> String {
        let path = template_file_path(&self.config.template_path, template_name);

        format!(
            "{GITHUB_API_BASE_URL}/repos/{}/{}/contents/{}?ref={}",
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/'),
            self.config.branch
        )
    }
}

impl TemplateSource for GitHubTemplateSource {
    async fn fetch(&self, template_name: &str) -> AutografResult<Vec<u8>> {
        let url = self.contents_url(template_name);
        debug!(url, "fetching dashboard template");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, RAW_CONTENT_MEDIA_TYPE)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::TemplateFetchFailed,
                    "failed to reach the template store",
                    err
                )
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            bail!(
                ErrorKind::TemplateNotFound,
                "template does not exist in the repository",
                template_name
            );
        }
        if !status.is_success() {
            bail!(
                ErrorKind::TemplateFetchFailed,
                "template store returned an error status",
                status
            );
        }

        let bytes = response.bytes().await.map_err(|err| {
            autograf_error!(
                ErrorKind::TemplateFetchFailed,
                "failed to read the template body",
                err
            )
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use autograf_config::SerializableSecretString;

    fn sample_source() -> GitHubTemplateSource {
        GitHubTemplateSource::new(TemplateSourceConfig {
            owner: "acme".to_string(),
            repo: "dashboards".to_string(),
            branch: "master".to_string(),
            template_path: "/templates".to_string(),
            access_token: SerializableSecretString::from("token"),
        })
        .unwrap()
    }

    #[test]
    fn contents_url_targets_the_configured_repository() {
        let url = sample_source().contents_url("service-overview");

        assert_eq!(
            url,
            "https://api.github.com/repos/acme/dashboards/contents/templates/service-overview.json?ref=master"
        );
    }
}
