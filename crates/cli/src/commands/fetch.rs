// `casegen fetch`: fetch an issue through the proxy and print it as text.

use clap::Args;
use serde::Serialize;

use casegen_common::types::IssueRecord;

use super::{block_on, Context};
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Issue key or id (e.g. `QA-42`).
    pub issue: String,
}

/// Flattened view of an issue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    pub key: String,
    pub summary: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub description: String,
    pub acceptance_criteria: String,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub author: Option<String>,
    pub created: Option<String>,
    pub body: String,
}

impl From<&IssueRecord> for IssueView {
    fn from(issue: &IssueRecord) -> Self {
        Self {
            key: issue.key.clone(),
            summary: issue.summary_text().to_string(),
            status: issue.status.clone(),
            priority: issue.priority.clone(),
            issue_type: issue.issue_type.clone(),
            assignee: issue.assignee.clone(),
            reporter: issue.reporter.clone(),
            created: issue.created.clone(),
            updated: issue.updated.clone(),
            components: issue.components.clone(),
            labels: issue.labels.clone(),
            description: issue.description_text(),
            acceptance_criteria: issue.acceptance_criteria_text(),
            comments: issue
                .comments
                .iter()
                .map(|comment| CommentView {
                    author: comment.author.clone(),
                    created: comment.created.clone(),
                    body: comment.body_text(),
                })
                .collect(),
        }
    }
}

pub fn run(args: FetchArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let config = ctx.user_config(&gateway)?;
    let client = ctx.client()?;

    let mut session = Session::new();
    let view = block_on(async {
        session.fetch(&client, &config, &args.issue).await.map(IssueView::from)
    })??;

    output::print_output(ctx.format, &view, format_human)?;
    Ok(())
}

pub(crate) fn format_human(view: &IssueView) -> String {
    let mut lines = vec![format!("{}  {}", view.key, view.summary)];

    let facts: Vec<String> = [
        ("Status", &view.status),
        ("Priority", &view.priority),
        ("Type", &view.issue_type),
        ("Assignee", &view.assignee),
        ("Reporter", &view.reporter),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|value| format!("{label}: {value}")))
    .collect();
    if !facts.is_empty() {
        lines.push(facts.join(" | "));
    }
    if !view.components.is_empty() {
        lines.push(format!("Components: {}", view.components.join(", ")));
    }
    if !view.labels.is_empty() {
        lines.push(format!("Labels: {}", view.labels.join(", ")));
    }

    push_section(&mut lines, "Description", &view.description);
    push_section(&mut lines, "Acceptance criteria", &view.acceptance_criteria);

    if !view.comments.is_empty() {
        lines.push(String::new());
        lines.push(format!("Comments ({}):", view.comments.len()));
        for comment in &view.comments {
            let author = comment.author.as_deref().unwrap_or("Unknown");
            lines.push(format!("  {author}: {}", comment.body.replace('\n', "\n    ")));
        }
    }

    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, title: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title}:"));
    lines.push(text.to_string());
}
