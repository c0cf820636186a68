// `casegen flatten`: render a rich-text document (ADF JSON) as plain text.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use casegen_common::adf;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct FlattenArgs {
    /// JSON file to read, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Starting list nesting level.
    #[arg(long, default_value_t = 0)]
    pub indent: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlattenResult {
    pub text: String,
}

pub fn run(args: FlattenArgs, ctx: &Context) -> anyhow::Result<()> {
    let raw = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read `{}`", args.input.display()))?
    };

    let result = FlattenResult { text: flatten_str(&raw, args.indent)? };
    output::print_output(ctx.format, &result, |result| result.text.clone())?;
    Ok(())
}

/// Parse `raw` as JSON and flatten it. Anything other than an object
/// renders as empty text.
fn flatten_str(raw: &str, indent: usize) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(raw).context("input is not valid JSON")?;
    Ok(adf::flatten_value(&value, indent))
}
