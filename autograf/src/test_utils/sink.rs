use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::sink::{DashboardRequest, DashboardResponse, DashboardSink};

#[derive(Debug, Default)]
struct Inner {
    created: Vec<(String, DashboardRequest)>,
    reject_creates: bool,
    fail_fetches: bool,
}

/// In-memory [`DashboardSink`] double.
///
/// Successful creates are stored under a generated uid and can be read back
/// through `fetch_dashboard`, wrapped the way the real sink wraps stored
/// definitions. Creates and fetches can be scripted to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryDashboardSink {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDashboardSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent creates fail like a 500 from the real sink.
    pub async fn reject_creates(&self, reject: bool) {
        let mut inner = self.inner.lock().await;
        inner.reject_creates = reject;
    }

    /// Makes subsequent dashboard fetches fail.
    pub async fn fail_fetches(&self, fail: bool) {
        let mut inner = self.inner.lock().await;
        inner.fail_fetches = fail;
    }

    /// Returns the accepted creation requests, in order.
    pub async fn created(&self) -> Vec<DashboardRequest> {
        let inner = self.inner.lock().await;
        inner
            .created
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

impl DashboardSink for MemoryDashboardSink {
    async fn create(&self, request: DashboardRequest) -> AutografResult<DashboardResponse> {
        let mut inner = self.inner.lock().await;
        if inner.reject_creates {
            bail!(
                ErrorKind::SinkRejected,
                "dashboard sink did not accept the dashboard",
                "500 Internal Server Error"
            );
        }

        let uid = format!("uid-{}", inner.created.len() + 1);
        inner.created.push((uid.clone(), request));

        Ok(DashboardResponse {
            id: inner.created.len() as i64,
            slug: String::new(),
            status: "success".to_string(),
            url: format!("/d/{uid}"),
            version: 1,
            uid,
        })
    }

    async fn fetch_dashboard(&self, uid: &str) -> AutografResult<Value> {
        let inner = self.inner.lock().await;
        if inner.fail_fetches {
            bail!(
                ErrorKind::DashboardNotFound,
                "fetch failure scripted by the test",
                uid
            );
        }

        match inner.created.iter().find(|(stored, _)| stored == uid) {
            Some((_, request)) => Ok(json!({
                "dashboard": request.dashboard,
                "meta": {"uid": uid, "version": 1},
            })),
            None => bail!(
                ErrorKind::DashboardNotFound,
                "dashboard sink has no dashboard with this uid",
                uid
            ),
        }
    }
}
