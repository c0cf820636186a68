// Result and diagnostic printing for casegen commands.
//
// Results go to stdout, diagnostics (errors, warnings) to stderr. A terminal
// gets text; anything else gets one JSON document per line.

use std::io::{self, IsTerminal, Write};

use casegen_common::error::CasegenError;
use serde::Serialize;

use crate::exit_code::UsageError;
use crate::session::SessionError;
use crate::settings::SettingsError;

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// `--json` wins; otherwise text only when stdout is a terminal.
    pub fn detect(json_flag: bool) -> Self {
        Self::choose(json_flag, io::stdout().is_terminal())
    }

    fn choose(json_flag: bool, stdout_is_tty: bool) -> Self {
        if json_flag || !stdout_is_tty {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Print a command result on stdout.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a command result. `human_fn` is only called for text output.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    let line = match format {
        OutputFormat::Human => human_fn(value),
        OutputFormat::Json => serde_json::to_string(value).map_err(io::Error::other)?,
    };
    writeln!(writer, "{line}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Error => ANSI_RED,
            Self::Warning => ANSI_YELLOW,
        }
    }
}

/// Write one diagnostic line. JSON nests it under `error` or `warning`.
fn write_diagnostic<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    severity: Severity,
    code: &str,
    message: &str,
    color: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Human => {
            let label = severity.label();
            if color {
                writeln!(writer, "{}{label}:{ANSI_RESET} {message}", severity.color())
            } else {
                writeln!(writer, "{label}: {message}")
            }
        }
        OutputFormat::Json => {
            let mut body = serde_json::Map::new();
            body.insert(
                severity.label().to_string(),
                serde_json::json!({ "code": code, "message": message }),
            );
            writeln!(writer, "{}", serde_json::Value::Object(body))
        }
    }
}

fn print_diagnostic(format: OutputFormat, severity: Severity, code: &str, message: &str) {
    let stderr = io::stderr();
    let color = stderr.is_terminal();
    // Nothing useful can be done if stderr itself is gone.
    let _ = write_diagnostic(&mut stderr.lock(), format, severity, code, message, color);
}

pub fn print_warning(format: OutputFormat, code: &str, message: &str) {
    print_diagnostic(format, Severity::Warning, code, message);
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_diagnostic(format, Severity::Error, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    for cause in error.chain() {
        if let Some(error) = cause.downcast_ref::<CasegenError>() {
            return casegen_error_message(error);
        }
        if let Some(error) = cause.downcast_ref::<SessionError>() {
            return match error {
                SessionError::Failed(inner) => casegen_error_message(inner),
                SessionError::Busy { .. } => ("OPERATION_IN_PROGRESS", error.to_string()),
                other => ("INVALID_EDIT", other.to_string()),
            };
        }
        if let Some(error) = cause.downcast_ref::<SettingsError>() {
            return ("SETTINGS_INVALID", format!("{error}. Fix or remove ~/.casegen/config.toml"));
        }
        if let Some(error) = cause.downcast_ref::<UsageError>() {
            return ("USAGE", error.to_string());
        }
    }

    ("ERROR", format!("{error:#}"))
}

fn casegen_error_message(error: &CasegenError) -> (&'static str, String) {
    let message = match error {
        CasegenError::ConfigurationMissing { field } => match config_flag(field) {
            Some(flag) => {
                format!("{field} is not configured. Run: casegen config set {flag} <value>")
            }
            None => error.to_string(),
        },
        CasegenError::RemoteRequestFailed { status: None, message } => {
            return (
                "PROXY_UNREACHABLE",
                format!(
                    "Could not reach the proxy ({message}). Start casegen-proxy or check \
                     proxy_url in ~/.casegen/config.toml"
                ),
            );
        }
        CasegenError::RemoteRequestFailed { status: Some(status), message } => {
            format!("Request failed with HTTP {status}: {message}")
        }
        CasegenError::ResponseShapeUnexpected(detail) => {
            format!("The reply could not be used ({detail}). Nothing was changed; try again.")
        }
        CasegenError::PersistenceFailed(detail) => {
            format!("Could not access the local store: {detail}")
        }
    };
    (error.code(), message)
}

fn config_flag(field: &str) -> Option<&'static str> {
    match field {
        "jiraUrl" => Some("--jira-url"),
        "jiraUsername" => Some("--jira-username"),
        "jiraApiToken" => Some("--jira-api-token"),
        _ => None,
    }
}
