// Failure taxonomy shared by the tracker client, the generation client, and
// the persistence gateway.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CasegenError {
    /// A required credential or field is absent. User-correctable.
    #[error("missing required configuration: {field}")]
    ConfigurationMissing { field: String },

    /// The tracker, the LLM, or the proxy itself answered with a failure.
    /// `status` is `None` when no HTTP response was received at all.
    #[error("remote request failed ({}): {message}", status_label(.status))]
    RemoteRequestFailed { status: Option<u16>, message: String },

    /// A reply lacked the expected structure or did not parse.
    #[error("unexpected response: {0}")]
    ResponseShapeUnexpected(String),

    /// The document store rejected a read or write.
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl CasegenError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::ConfigurationMissing { field: field.into() }
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteRequestFailed { status, message: message.into() }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::ResponseShapeUnexpected(message.into())
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing { .. } => "CONFIGURATION_MISSING",
            Self::RemoteRequestFailed { .. } => "REMOTE_REQUEST_FAILED",
            Self::ResponseShapeUnexpected(_) => "RESPONSE_SHAPE_UNEXPECTED",
            Self::PersistenceFailed(_) => "PERSISTENCE_FAILED",
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("HTTP {status}"),
        None => "no response".to_string(),
    }
}
