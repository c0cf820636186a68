use casegen_common::error::CasegenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document path segment `{segment}`: {reason}")]
    InvalidPath { segment: String, reason: &'static str },

    #[error("failed to prepare store directory `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error while trying to {action}: {source}")]
    Sqlite {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("document `{path}` is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn sqlite(action: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Sqlite { action, source }
    }
}

impl From<StoreError> for CasegenError {
    fn from(error: StoreError) -> Self {
        CasegenError::PersistenceFailed(error.to_string())
    }
}
