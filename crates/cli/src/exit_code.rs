// Consistent exit codes for the casegen CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   10 = configuration missing
//   11 = remote request failed (tracker, LLM, or proxy)
//   12 = unexpected response shape
//   13 = persistence failed
//   14 = proxy not reachable

use std::process;

use casegen_common::error::CasegenError;

use crate::session::SessionError;
use crate::settings::SettingsError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    ConfigMissing = 10,
    Remote = 11,
    ResponseShape = 12,
    Persistence = 13,
    ProxyDown = 14,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(error) = cause.downcast_ref::<CasegenError>() {
                return Self::from_casegen(error);
            }
            if let Some(error) = cause.downcast_ref::<SessionError>() {
                return match error {
                    SessionError::Failed(inner) => Self::from_casegen(inner),
                    _ => Self::Usage,
                };
            }
            if cause.downcast_ref::<SettingsError>().is_some() {
                return Self::ConfigMissing;
            }
            if cause.downcast_ref::<UsageError>().is_some() {
                return Self::Usage;
            }
        }

        Self::Error
    }

    pub fn from_casegen(error: &CasegenError) -> Self {
        match error {
            CasegenError::ConfigurationMissing { .. } => Self::ConfigMissing,
            CasegenError::RemoteRequestFailed { status: None, .. } => Self::ProxyDown,
            CasegenError::RemoteRequestFailed { .. } => Self::Remote,
            CasegenError::ResponseShapeUnexpected(_) => Self::ResponseShape,
            CasegenError::PersistenceFailed(_) => Self::Persistence,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

/// Invalid command-line input that clap cannot catch on its own.
#[derive(Debug)]
pub struct UsageError(pub String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 2);
        assert_eq!(ExitCode::ConfigMissing.code(), 10);
        assert_eq!(ExitCode::Remote.code(), 11);
        assert_eq!(ExitCode::ResponseShape.code(), 12);
        assert_eq!(ExitCode::Persistence.code(), 13);
        assert_eq!(ExitCode::ProxyDown.code(), 14);
    }

    #[test]
    fn every_error_kind_has_a_distinct_code() {
        let codes = [
            ExitCode::from_casegen(&CasegenError::missing("jiraUrl")),
            ExitCode::from_casegen(&CasegenError::remote(Some(404), "gone")),
            ExitCode::from_casegen(&CasegenError::remote(None, "refused")),
            ExitCode::from_casegen(&CasegenError::shape("not json")),
            ExitCode::from_casegen(&CasegenError::PersistenceFailed("disk".into())),
        ];
        assert_eq!(
            codes,
            [
                ExitCode::ConfigMissing,
                ExitCode::Remote,
                ExitCode::ProxyDown,
                ExitCode::ResponseShape,
                ExitCode::Persistence
            ]
        );
    }

    #[test]
    fn from_error_finds_casegen_error_under_context() {
        let err = anyhow::Error::new(CasegenError::remote(Some(500), "boom"))
            .context("generate failed for QA-1");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Remote);
    }

    #[test]
    fn from_error_unwraps_session_failures() {
        let err = anyhow::Error::new(SessionError::Failed(CasegenError::shape("bad reply")));
        assert_eq!(ExitCode::from_error(&err), ExitCode::ResponseShape);

        let err = anyhow::Error::new(SessionError::NoSuchTestCase(4));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    }

    #[test]
    fn from_error_usage() {
        let err = anyhow::Error::new(UsageError("case numbers start at 1".into()));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    }

    #[test]
    fn from_error_generic_is_error() {
        let err = anyhow::anyhow!("something went wrong");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
    }
}
