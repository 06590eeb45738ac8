use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Invalid stream store configuration.
    #[error("Invalid stream configuration: {0}")]
    InvalidStream(String),

    /// Invalid template source configuration.
    #[error("Invalid template source configuration: {0}")]
    InvalidTemplateSource(String),

    /// Invalid dashboard sink configuration.
    #[error("Invalid dashboard configuration: {0}")]
    InvalidDashboard(String),
}
