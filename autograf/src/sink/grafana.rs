use autograf_config::shared::DashboardConfig;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;

use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::sink::{DashboardRequest, DashboardResponse, DashboardSink};
use crate::{autograf_error, bail};

/// Endpoint creating or overwriting dashboards.
const CREATE_DASHBOARD_PATH: &str = "/api/dashboards/db";

/// Endpoint returning the full stored definition of a dashboard.
const DASHBOARD_BY_UID_PATH: &str = "/api/dashboards/uid";

/// Grafana-backed [`DashboardSink`].
///
/// Thin wrapper over the Grafana HTTP API with bearer-token authentication;
/// payloads go through as-is in both directions.
#[derive(Debug, Clone)]
pub struct GrafanaSink {
    client: reqwest::Client,
    config: DashboardConfig,
}

impl GrafanaSink {
    /// Creates a sink over the given Grafana configuration.
    pub fn new(config: DashboardConfig) -> AutografResult<Self> {
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
                    "failed to construct the dashboard sink HTTP client",
                    err
                )
            })?;

        Ok(Self { client, config })
    }

    /// Joins a path onto the configured base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl DashboardSink for GrafanaSink {
    async fn create(&self, request: DashboardRequest) -> AutografResult<DashboardResponse> {
        let url = self.url(CREATE_DASHBOARD_PATH);
        debug!(url, "creating dashboard in the sink");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::SinkRequestFailed,
                    "failed to reach the dashboard sink",
                    err
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                ErrorKind::SinkRejected,
                "dashboard sink did not accept the dashboard",
                status
            );
        }

        let created = response.json::<DashboardResponse>().await.map_err(|err| {
            autograf_error!(
                ErrorKind::DeserializationError,
                "failed to decode the dashboard sink response",
                err
            )
        })?;

        Ok(created)
    }

    async fn fetch_dashboard(&self, uid: &str) -> AutografResult<Value> {
        let url = self.url(&format!("{DASHBOARD_BY_UID_PATH}/{uid}"));
        debug!(url, "fetching dashboard from the sink");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .send()
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::SinkRequestFailed,
                    "failed to reach the dashboard sink",
                    err
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                ErrorKind::DashboardNotFound,
                "dashboard sink has no dashboard with this uid",
                uid
            );
        }

        let dashboard = response.json::<Value>().await.map_err(|err| {
            autograf_error!(
                ErrorKind::DeserializationError,
                "failed to decode the stored dashboard",
                err
            )
        })?;

        Ok(dashboard)
    }
}
