use std::error;
use std::fmt;

/// Convenient result type for provisioning operations using [`AutografError`]
/// as the error type.
pub type AutografResult<T> = Result<T, AutografError>;

/// Main error type for provisioning operations.
///
/// [`AutografError`] pairs a machine-readable [`ErrorKind`] with a static
/// description and optional dynamic detail. The kind is what the orchestrator
/// keys its acknowledgment decisions on; the description and detail only feed
/// the logs.
#[derive(Debug, Clone)]
pub struct AutografError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
///
/// Users should not interact with this type directly but use [`AutografError`]
/// methods instead.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Specific categories of errors that can occur while provisioning.
///
/// Kinds are organized by collaborator: the event stream, the template
/// source, and the dashboard sink, plus data and configuration failures.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Stream errors
    StreamConnectionFailed,
    StreamGroupCreationFailed,
    StreamReadFailed,
    StreamAckFailed,
    StreamPublishFailed,

    // Template source errors
    TemplateNotFound,
    TemplateFetchFailed,
    TemplateRenderFailed,

    // Dashboard sink errors
    SinkRequestFailed,
    SinkRejected,
    DashboardNotFound,

    // Data errors
    ConversionError,
    SerializationError,
    DeserializationError,

    // Configuration & IO errors
    ConfigError,
    IoError,

    // Unknown / Uncategorized
    Unknown,
}

impl AutografError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for AutografError {
    fn eq(&self, other: &AutografError) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for AutografError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
        }
    }
}

impl error::Error for AutografError {}

/// Creates an [`AutografError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for AutografError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> AutografError {
        AutografError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates an [`AutografError`] from an error kind, static description, and
/// dynamic detail.
impl From<(ErrorKind, &'static str, String)> for AutografError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> AutografError {
        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

// Common standard library error conversions

/// Converts [`std::io::Error`] to [`AutografError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for AutografError {
    fn from(err: std::io::Error) -> AutografError {
        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`AutografError`] with an appropriate
/// error kind.
///
/// Maps to [`ErrorKind::SerializationError`] for serialization failures and
/// [`ErrorKind::DeserializationError`] for deserialization failures based on
/// error classification.
impl From<serde_json::Error> for AutografError {
    fn from(err: serde_json::Error) -> AutografError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`std::string::FromUtf8Error`] to [`AutografError`] with
/// [`ErrorKind::ConversionError`].
impl From<std::string::FromUtf8Error> for AutografError {
    fn from(err: std::string::FromUtf8Error) -> AutografError {
        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::ConversionError,
                "UTF-8 string conversion failed",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`redis::RedisError`] to [`AutografError`] with an appropriate
/// error kind.
///
/// Connection-level failures map to [`ErrorKind::StreamConnectionFailed`];
/// everything else is reported as a failed stream command. Callers that know
/// which command failed construct the error themselves with a more precise
/// kind.
impl From<redis::RedisError> for AutografError {
    fn from(err: redis::RedisError) -> AutografError {
        let (kind, description) = if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
        {
            (
                ErrorKind::StreamConnectionFailed,
                "stream store connection error",
            )
        } else {
            (ErrorKind::StreamReadFailed, "stream command failed")
        };

        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`handlebars::RenderError`] to [`AutografError`] with
/// [`ErrorKind::TemplateRenderFailed`].
///
/// Covers both template parse failures and strict-mode substitution failures,
/// which handlebars reports through the same error type.
impl From<handlebars::RenderError> for AutografError {
    fn from(err: handlebars::RenderError) -> AutografError {
        AutografError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::TemplateRenderFailed,
                "failed to render the dashboard template",
                err.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_detail_are_preserved() {
        let err = AutografError::from((
            ErrorKind::TemplateNotFound,
            "template does not exist",
            "service-overview".to_string(),
        ));

        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
        assert_eq!(err.detail(), Some("service-overview"));
        assert!(err.to_string().contains("service-overview"));
    }

    #[test]
    fn errors_compare_by_kind() {
        let a = AutografError::from((ErrorKind::SinkRejected, "rejected"));
        let b = AutografError::from((
            ErrorKind::SinkRejected,
            "rejected",
            "500 Internal Server Error".to_string(),
        ));

        assert_eq!(a, b);
    }
}
