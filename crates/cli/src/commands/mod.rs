// CLI subcommand dispatch.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context as _;
use casegen_common::error::CasegenError;
use casegen_common::types::UserConfig;
use casegen_store::{PersistenceGateway, SqliteDocumentStore};
use clap::Subcommand;

use crate::client::ProxyClient;
use crate::output::OutputFormat;
use crate::settings::Settings;

pub mod config;
pub mod edit;
pub mod fetch;
pub mod flatten;
pub mod generate;
pub mod saved;

#[derive(Subcommand)]
pub enum Command {
    /// Show or update the stored tracker configuration
    Config(config::ConfigArgs),
    /// Fetch an issue and print it as plain text
    Fetch(fetch::FetchArgs),
    /// Generate a short summary of an issue
    Summarize(generate::TextArgs),
    /// Generate acceptance criteria for an issue
    Criteria(generate::TextArgs),
    /// Generate test cases for an issue
    Generate(generate::GenerateArgs),
    /// List, show, or delete saved test cases
    Saved(saved::SavedArgs),
    /// Edit one cell of a saved test-case set and save it again
    Edit(edit::EditArgs),
    /// Convert a rich-text document (ADF JSON) to plain text
    Flatten(flatten::FlattenArgs),
}

/// Resolved settings and output format shared by every command.
pub struct Context {
    pub settings: Settings,
    pub format: OutputFormat,
}

impl Context {
    pub fn user_id(&self) -> &str {
        &self.settings.user_id
    }

    pub fn gateway(&self) -> anyhow::Result<PersistenceGateway> {
        let path = self.settings.store_path()?;
        let store = SqliteDocumentStore::open(&path)
            .map_err(CasegenError::from)
            .with_context(|| format!("failed to open store at `{}`", path.display()))?;
        Ok(PersistenceGateway::new(Arc::new(store)))
    }

    pub fn client(&self) -> Result<ProxyClient, CasegenError> {
        ProxyClient::http(&self.settings.proxy_url, self.settings.timeout())
    }

    /// Stored tracker configuration. Nothing stored counts as a missing URL.
    pub fn user_config(&self, gateway: &PersistenceGateway) -> Result<UserConfig, CasegenError> {
        gateway.load_config(self.user_id())?.ok_or_else(|| CasegenError::missing("jiraUrl"))
    }
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

pub fn run(cmd: Command, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        Command::Config(args) => config::run(args, ctx),
        Command::Fetch(args) => fetch::run(args, ctx),
        Command::Summarize(args) => generate::run_summary(args, ctx),
        Command::Criteria(args) => generate::run_criteria(args, ctx),
        Command::Generate(args) => generate::run(args, ctx),
        Command::Saved(args) => saved::run(args, ctx),
        Command::Edit(args) => edit::run(args, ctx),
        Command::Flatten(args) => flatten::run(args, ctx),
    }
}
