// `casegen config`: show or update the stored tracker configuration.

use clap::{Args, Subcommand};
use serde::Serialize;

use casegen_common::types::UserConfig;

use super::Context;
use crate::exit_code::UsageError;
use crate::output;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective settings and tracker configuration
    Show,
    /// Update tracker configuration fields (unset flags keep their value)
    Set(SetArgs),
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Tracker base URL (e.g. `https://acme.atlassian.net`).
    #[arg(long)]
    jira_url: Option<String>,

    /// Tracker account name or email.
    #[arg(long)]
    jira_username: Option<String>,

    /// Tracker API token.
    #[arg(long)]
    jira_api_token: Option<String>,

    /// Custom field that holds acceptance criteria. Empty resets the default.
    #[arg(long)]
    acceptance_field: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub user_id: String,
    pub proxy_url: String,
    pub store_path: Option<String>,
    pub configured: bool,
    pub jira_url: String,
    pub jira_username: String,
    /// Masked; never printed in full.
    pub jira_api_token: String,
    pub acceptance_criteria_field: String,
}

impl ConfigView {
    fn new(ctx: &Context, config: Option<&UserConfig>) -> Self {
        let stored = config.cloned().unwrap_or_default();
        Self {
            user_id: ctx.settings.user_id.clone(),
            proxy_url: ctx.settings.proxy_url.clone(),
            store_path: ctx.settings.store_path().ok().map(|path| path.display().to_string()),
            configured: config.is_some(),
            jira_api_token: mask(&stored.jira_api_token),
            acceptance_criteria_field: stored.acceptance_criteria_field().to_string(),
            jira_url: stored.jira_url,
            jira_username: stored.jira_username,
        }
    }
}

pub fn run(args: ConfigArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let current = gateway.load_config(ctx.user_id())?;

    let view = match args.action {
        ConfigAction::Show => ConfigView::new(ctx, current.as_ref()),
        ConfigAction::Set(set) => {
            let updated = merge(current.unwrap_or_default(), set)?;
            gateway.save_config(ctx.user_id(), &updated)?;
            ConfigView::new(ctx, Some(&updated))
        }
    };

    output::print_output(ctx.format, &view, format_human)?;
    Ok(())
}

fn merge(mut config: UserConfig, set: SetArgs) -> Result<UserConfig, UsageError> {
    if set.jira_url.is_none()
        && set.jira_username.is_none()
        && set.jira_api_token.is_none()
        && set.acceptance_field.is_none()
    {
        return Err(UsageError(
            "nothing to set; pass --jira-url, --jira-username, --jira-api-token, or \
             --acceptance-field"
                .into(),
        ));
    }

    if let Some(url) = set.jira_url {
        config.jira_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(username) = set.jira_username {
        config.jira_username = username.trim().to_string();
    }
    if let Some(token) = set.jira_api_token {
        config.jira_api_token = token.trim().to_string();
    }
    if let Some(field) = set.acceptance_field {
        let field = field.trim();
        config.acceptance_criteria_field = (!field.is_empty()).then(|| field.to_string());
    }
    Ok(config)
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 8 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

fn format_human(view: &ConfigView) -> String {
    let or_unset = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };
    let mut lines = vec![
        format!("User:              {}", view.user_id),
        format!("Proxy:             {}", view.proxy_url),
        format!("Store:             {}", view.store_path.as_deref().unwrap_or("(unknown)")),
    ];
    if !view.configured {
        lines.push(
            "Tracker:           not configured. Run: casegen config set --jira-url ...".into(),
        );
        return lines.join("\n");
    }
    lines.push(format!("Tracker URL:       {}", or_unset(&view.jira_url)));
    lines.push(format!("Tracker user:      {}", or_unset(&view.jira_username)));
    lines.push(format!("API token:         {}", or_unset(&view.jira_api_token)));
    lines.push(format!("Acceptance field:  {}", view.acceptance_criteria_field));
    lines.join("\n")
}
