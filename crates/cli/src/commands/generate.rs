// `casegen summarize`, `casegen criteria` and `casegen generate`.

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use casegen_common::generation::GenerationKind;
use casegen_common::types::TestCase;

use super::{block_on, Context};
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct TextArgs {
    /// Issue key or id (e.g. `QA-42`).
    pub issue: String,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Issue key or id (e.g. `QA-42`).
    pub issue: String,

    /// Save the generated test cases, replacing any saved set for the issue.
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResult {
    pub issue_key: String,
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub issue_key: String,
    pub test_cases: Vec<TestCase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

pub fn run_summary(args: TextArgs, ctx: &Context) -> anyhow::Result<()> {
    run_text(args, GenerationKind::Summary, ctx)
}

pub fn run_criteria(args: TextArgs, ctx: &Context) -> anyhow::Result<()> {
    run_text(args, GenerationKind::AcceptanceCriteria, ctx)
}

fn run_text(args: TextArgs, kind: GenerationKind, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let config = ctx.user_config(&gateway)?;
    let client = ctx.client()?;

    let mut session = Session::new();
    let result = block_on(async {
        let issue_key = session.fetch(&client, &config, &args.issue).await?.key.clone();
        let text = session.generate_text(&client, kind).await?.to_string();
        Ok::<_, anyhow::Error>(TextResult { issue_key, kind: kind.as_str(), text })
    })?
    .with_context(|| format!("{} generation failed for `{}`", kind.as_str(), args.issue))?;

    output::print_output(ctx.format, &result, format_text)?;
    Ok(())
}

pub fn run(args: GenerateArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let config = ctx.user_config(&gateway)?;
    let client = ctx.client()?;

    let mut session = Session::new();
    let (issue_key, test_cases) = block_on(async {
        let issue_key = session.fetch(&client, &config, &args.issue).await?.key.clone();
        let cases = session.generate_test_cases(&client).await?.to_vec();
        Ok::<_, anyhow::Error>((issue_key, cases))
    })?
    .with_context(|| format!("test case generation failed for `{}`", args.issue))?;

    let saved_at = if args.save {
        if let Some(previous) = gateway.load_test_cases(ctx.user_id(), args.issue.trim())? {
            let message = format!(
                "replacing {} saved test cases for {}",
                previous.test_cases.len(),
                previous.issue_key
            );
            output::print_warning(ctx.format, "REPLACING_SAVED", &message);
        }
        Some(session.save(&gateway, ctx.user_id())?.saved_at)
    } else {
        None
    };

    let result = GenerateResult { issue_key, test_cases, saved_at };
    output::print_output(ctx.format, &result, format_generated)?;
    Ok(())
}

fn format_text(result: &TextResult) -> String {
    let heading = match result.kind {
        "summary" => "Summary",
        _ => "Acceptance criteria",
    };
    format!("{heading} for {}:\n\n{}", result.issue_key, result.text)
}

fn format_generated(result: &GenerateResult) -> String {
    let mut out = format!("{} test cases for {}", result.test_cases.len(), result.issue_key);
    if let Some(saved_at) = result.saved_at {
        out.push_str(&format!(" (saved {})", saved_at.format("%Y-%m-%d %H:%M UTC")));
    }
    out.push_str("\n\n");
    out.push_str(&render_cases(&result.test_cases));
    out
}

/// Numbered listing shared by `generate`, `saved show` and `edit`.
pub(crate) fn render_cases(cases: &[TestCase]) -> String {
    if cases.is_empty() {
        return "(no test cases)".to_string();
    }
    cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let mut block = format!("{}. [{}] {}", index + 1, case.kind, case.title);
            for (step, text) in case.steps.iter().enumerate() {
                block.push_str(&format!("\n   {}. {text}", step + 1));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
