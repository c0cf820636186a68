// `casegen saved`: list, show or delete saved test-case sets.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use casegen_common::types::TestCaseSet;
use casegen_store::SavedIssue;

use super::generate::render_cases;
use super::Context;
use crate::exit_code::UsageError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct SavedArgs {
    #[command(subcommand)]
    action: SavedAction,
}

#[derive(Debug, Subcommand)]
enum SavedAction {
    /// List saved sets, newest first
    List,
    /// Print the saved test cases for an issue
    Show {
        /// Issue key or id the set was saved under.
        issue: String,
    },
    /// Delete the saved test cases for an issue
    Delete {
        /// Issue key or id the set was saved under.
        issue: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedListItem {
    pub issue_id: String,
    pub issue_key: String,
    pub summary: String,
    pub saved_at: DateTime<Utc>,
    pub case_count: usize,
}

impl From<SavedIssue> for SavedListItem {
    fn from(saved: SavedIssue) -> Self {
        Self {
            issue_id: saved.issue_id,
            issue_key: saved.issue_key,
            summary: saved.summary,
            saved_at: saved.saved_at,
            case_count: saved.case_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub issue_id: String,
    pub deleted: bool,
}

pub fn run(args: SavedArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;

    match args.action {
        SavedAction::List => {
            let items: Vec<SavedListItem> = gateway
                .list_saved_issues(ctx.user_id())?
                .into_iter()
                .map(SavedListItem::from)
                .collect();
            output::print_output(ctx.format, &items, |items| format_list(items))?;
        }
        SavedAction::Show { issue } => {
            let mut session = Session::new();
            let Some(set) = session.load_saved(&gateway, ctx.user_id(), &issue)? else {
                return Err(UsageError(format!("no saved test cases for `{issue}`")).into());
            };
            output::print_output(ctx.format, &set, format_set)?;
        }
        SavedAction::Delete { issue } => {
            let deleted = gateway.delete_test_cases(ctx.user_id(), &issue)?;
            let result = DeleteResult { issue_id: issue, deleted };
            output::print_output(ctx.format, &result, format_delete)?;
        }
    }
    Ok(())
}

fn format_list(items: &[SavedListItem]) -> String {
    if items.is_empty() {
        return "No saved test cases.".to_string();
    }
    items
        .iter()
        .map(|item| {
            let summary =
                if item.summary.is_empty() { String::new() } else { format!("  {}", item.summary) };
            format!(
                "{}  {} cases  {}{summary}",
                item.issue_key,
                item.case_count,
                item.saved_at.format("%Y-%m-%d %H:%M"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn format_set(set: &TestCaseSet) -> String {
    let mut heading = set.issue_key.clone();
    if !set.summary.is_empty() {
        heading.push_str(&format!("  {}", set.summary));
    }
    format!(
        "{heading}\nSaved {}\n\n{}",
        set.saved_at.format("%Y-%m-%d %H:%M UTC"),
        render_cases(&set.test_cases)
    )
}

fn format_delete(result: &DeleteResult) -> String {
    if result.deleted {
        format!("Deleted saved test cases for {}", result.issue_id)
    } else {
        format!("No saved test cases for {}", result.issue_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegen_common::types::{TestCase, TestCaseKind};
    use chrono::TimeZone;

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().expect("valid timestamp")
    }

    #[test]
    fn list_shows_key_count_and_summary() {
        let items = vec![SavedListItem {
            issue_id: "QA-42".into(),
            issue_key: "QA-42".into(),
            summary: "Reset password".into(),
            saved_at: saved_at(),
            case_count: 3,
        }];
        assert_eq!(format_list(&items), "QA-42  3 cases  2024-03-01 09:30  Reset password");
    }

    #[test]
    fn list_json_uses_camel_case_and_rfc3339_time() {
        let items = vec![SavedListItem {
            issue_id: "10042".into(),
            issue_key: "QA-42".into(),
            summary: String::new(),
            saved_at: saved_at(),
            case_count: 0,
        }];
        let mut buf = Vec::new();
        output::write_output(&mut buf, output::OutputFormat::Json, &items, |items| {
            format_list(items)
        })
        .expect("write should succeed");

        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("output is JSON");
        assert_eq!(parsed[0]["issueId"], "10042");
        assert_eq!(parsed[0]["issueKey"], "QA-42");
        assert_eq!(parsed[0]["caseCount"], 0);
        assert_eq!(parsed[0]["savedAt"], "2024-03-01T09:30:00Z");

        let mut buf = Vec::new();
        output::write_output(&mut buf, output::OutputFormat::Human, &items, |items| {
            format_list(items)
        })
        .expect("write should succeed");
        assert_eq!(String::from_utf8(buf).expect("utf-8"), "QA-42  0 cases  2024-03-01 09:30\n");
    }

    #[test]
    fn empty_list_has_friendly_message() {
        assert_eq!(format_list(&[]), "No saved test cases.");
    }

    #[test]
    fn set_output_includes_heading_and_cases() {
        let set = TestCaseSet {
            test_cases: vec![TestCase {
                title: "Happy path".into(),
                kind: TestCaseKind::Positive,
                steps: vec!["Do it".into()],
            }],
            saved_at: saved_at(),
            issue_key: "QA-42".into(),
            summary: "Reset password".into(),
        };
        assert_eq!(
            format_set(&set),
            "QA-42  Reset password\nSaved 2024-03-01 09:30 UTC\n\n\
             1. [Positive] Happy path\n   1. Do it"
        );
    }

    #[test]
    fn delete_output_reports_missing_set() {
        let result = DeleteResult { issue_id: "QA-9".into(), deleted: false };
        assert_eq!(format_delete(&result), "No saved test cases for QA-9");
    }
}
