// `casegen edit`: change one cell of a saved test-case set and save it.
//
// Case and step numbers on the command line start at 1.

use clap::{Args, Subcommand};
use serde::Serialize;

use casegen_common::types::{TestCase, TestCaseKind, TestCaseSet};

use super::saved::format_set;
use super::Context;
use crate::exit_code::UsageError;
use crate::output;
use crate::session::{Session, SessionError};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Issue key or id the set was saved under.
    pub issue: String,

    #[command(subcommand)]
    action: EditAction,
}

#[derive(Debug, Clone, Subcommand)]
enum EditAction {
    /// Rename a test case
    Title { case: usize, title: String },
    /// Change a test case's type (Positive, Negative, Edge Case, or free text)
    Type { case: usize, kind: String },
    /// Replace the text of one step
    Step { case: usize, step: usize, text: String },
    /// Insert a step before STEP (one past the last step appends)
    InsertStep { case: usize, step: usize, text: String },
    /// Remove one step
    RemoveStep { case: usize, step: usize },
    /// Append a new test case
    Add {
        title: String,
        #[arg(long = "type", default_value = "Positive")]
        kind: String,
        /// Step text; repeat for several steps.
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    /// Remove a test case
    Remove { case: usize },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub change: String,
    #[serde(flatten)]
    pub set: TestCaseSet,
}

pub fn run(args: EditArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;

    let mut session = Session::new();
    if session.load_saved(&gateway, ctx.user_id(), &args.issue)?.is_none() {
        return Err(UsageError(format!("no saved test cases for `{}`", args.issue)).into());
    }

    let change = apply(&mut session, args.action)?;
    let set = session.save(&gateway, ctx.user_id())?;
    tracing::info!(issue = %args.issue, %change, "edited saved test cases");

    let result = EditResult { change, set };
    output::print_output(ctx.format, &result, |result| {
        format!("{}\n\n{}", result.change, format_set(&result.set))
    })?;
    Ok(())
}

/// Apply one edit to the loaded draft and describe it.
fn apply(session: &mut Session, action: EditAction) -> anyhow::Result<String> {
    let change = match action {
        EditAction::Title { case, title } => {
            session.set_title(index("case", case)?, &title).map_err(renumber)?;
            format!("Renamed test case {case}")
        }
        EditAction::Type { case, kind } => {
            let kind = TestCaseKind::parse(&kind);
            session.set_kind(index("case", case)?, kind.clone()).map_err(renumber)?;
            format!("Set test case {case} type to {kind}")
        }
        EditAction::Step { case, step, text } => {
            session
                .set_step(index("case", case)?, index("step", step)?, &text)
                .map_err(renumber)?;
            format!("Updated step {step} of test case {case}")
        }
        EditAction::InsertStep { case, step, text } => {
            session
                .insert_step(index("case", case)?, index("step", step)?, &text)
                .map_err(renumber)?;
            format!("Inserted step {step} into test case {case}")
        }
        EditAction::RemoveStep { case, step } => {
            session
                .remove_step(index("case", case)?, index("step", step)?)
                .map_err(renumber)?;
            format!("Removed step {step} of test case {case}")
        }
        EditAction::Add { title, kind, steps } => {
            let kind = TestCaseKind::parse(&kind);
            let case = TestCase { title: title.trim().to_string(), kind, steps };
            let index = session.add_test_case(case).map_err(renumber)?;
            format!("Added test case {}", index + 1)
        }
        EditAction::Remove { case } => {
            let removed = session.remove_test_case(index("case", case)?).map_err(renumber)?;
            format!("Removed test case {case} ({})", removed.title)
        }
    };
    Ok(change)
}

fn index(what: &str, number: usize) -> Result<usize, UsageError> {
    number.checked_sub(1).ok_or_else(|| UsageError(format!("{what} numbers start at 1")))
}

/// Report out-of-range indices the way they were typed.
fn renumber(error: SessionError) -> SessionError {
    match error {
        SessionError::NoSuchTestCase(case) => SessionError::NoSuchTestCase(case + 1),
        SessionError::NoSuchStep { case, step } => {
            SessionError::NoSuchStep { case: case + 1, step: step + 1 }
        }
        other => other,
    }
}
