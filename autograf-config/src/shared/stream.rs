use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for connecting to the Redis stream store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamConfig {
    /// Connection URL of the stream store, e.g. `redis://localhost:6379`.
    pub addr: String,
}

impl StreamConfig {
    /// Validates the [`StreamConfig`].
    ///
    /// The address must be present and carry a Redis URL scheme; reachability
    /// is only verified by the connection attempt at startup.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.addr.is_empty() {
            return Err(ValidationError::InvalidStream(
                "`addr` cannot be empty".to_string(),
            ));
        }

        if !self.addr.starts_with("redis://") && !self.addr.starts_with("rediss://") {
            return Err(ValidationError::InvalidStream(
                "`addr` must start with redis:// or rediss://".to_string(),
            ));
        }

        Ok(())
    }
}
