use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::template::TemplateSource;

#[derive(Debug, Default)]
struct Inner {
    templates: HashMap<String, Vec<u8>>,
    fetched: Vec<String>,
}

/// In-memory [`TemplateSource`] double.
///
/// Templates not inserted beforehand report [`ErrorKind::TemplateNotFound`],
/// mirroring a 404 from the real store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under the given name.
    pub async fn insert(&self, name: &str, content: Vec<u8>) {
        let mut inner = self.inner.lock().await;
        inner.templates.insert(name.to_string(), content);
    }

    /// Returns the names of the fetch attempts, in order.
    pub async fn fetched(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.fetched.clone()
    }
}

impl TemplateSource for MemoryTemplateSource {
    async fn fetch(&self, template_name: &str) -> AutografResult<Vec<u8>> {
        let mut inner = self.inner.lock().await;
        inner.fetched.push(template_name.to_string());

        match inner.templates.get(template_name) {
            Some(content) => Ok(content.clone()),
            None => bail!(
                ErrorKind::TemplateNotFound,
                "template does not exist in the repository",
                template_name
            ),
        }
    }
}
