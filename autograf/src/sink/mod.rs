//! Dashboard sink access.

mod grafana;

pub use grafana::GrafanaSink;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AutografResult;

/// Message recorded against dashboard versions created by the provisioner.
pub const DASHBOARD_CHANGE_MESSAGE: &str = "Creating dashboard from Autograf";

/// Dashboard creation request accepted by the sink.
///
/// The dashboard payload is opaque; only the placement policy fields are
/// fixed: dashboards land in the root folder and always overwrite any
/// previous version, which makes re-provisioning idempotent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    pub dashboard: Value,
    pub folder_id: i64,
    pub folder_uid: String,
    pub message: String,
    pub overwrite: bool,
}

impl DashboardRequest {
    /// Wraps a rendered dashboard into a creation request with the fixed
    /// placement policy.
    pub fn new(dashboard: Value) -> Self {
        Self {
            dashboard,
            folder_id: 0,
            folder_uid: String::new(),
            message: DASHBOARD_CHANGE_MESSAGE.to_string(),
            overwrite: true,
        }
    }
}

/// Response returned by the sink for a created dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    pub uid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version: i64,
}

/// Write access to the dashboard store.
///
/// Implementations never validate the dashboard schema; the payload is passed
/// through untouched.
pub trait DashboardSink {
    /// Creates a dashboard, returning the sink's response on any 2xx status.
    ///
    /// A non-2xx status is reported as [`ErrorKind::SinkRejected`].
    ///
    /// [`ErrorKind::SinkRejected`]: crate::error::ErrorKind::SinkRejected
    fn create(
        &self,
        request: DashboardRequest,
    ) -> impl Future<Output = AutografResult<DashboardResponse>> + Send;

    /// Fetches the full stored definition of a dashboard by its uid.
    fn fetch_dashboard(&self, uid: &str) -> impl Future<Output = AutografResult<Value>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn creation_request_carries_the_fixed_policy_fields() {
        let request = DashboardRequest::new(json!({"title": "Team A"}));

        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(
            encoded,
            json!({
                "dashboard": {"title": "Team A"},
                "folderId": 0,
                "folderUid": "",
                "message": DASHBOARD_CHANGE_MESSAGE,
                "overwrite": true,
            })
        );
    }

    #[test]
    fn sink_response_decodes_from_the_wire_shape() {
        let response: DashboardResponse = serde_json::from_str(
            r#"{"id":2,"slug":"monitoring-the-monitor","status":"success","uid":"Ui4ofGcnz","url":"/d/Ui4ofGcnz/monitoring-the-monitor","version":1}"#,
        )
        .unwrap();

        assert_eq!(response.uid, "Ui4ofGcnz");
        assert_eq!(response.status, "success");
        assert_eq!(response.version, 1);
    }
}
