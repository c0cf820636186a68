// casegen CLI entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod exit_code;
mod output;
mod session;
mod settings;

use exit_code::ExitCode;
use output::OutputFormat;
use settings::{Settings, SettingsOverrides};

#[derive(Parser)]
#[command(name = "casegen", version, about = "Generate test cases from tracker issues")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Proxy base URL (overrides the settings file).
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    /// User whose configuration and saved test cases are used.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Path of the local SQLite store.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Settings file to read instead of `~/.casegen/config.toml`.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = OutputFormat::detect(cli.json);
    match run(cli, format) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            output::print_anyhow_error(format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}

fn run(cli: Cli, format: OutputFormat) -> anyhow::Result<()> {
    let overrides = SettingsOverrides {
        settings_file: cli.settings,
        proxy_url: cli.proxy_url,
        user_id: cli.user,
        store_path: cli.store,
    };
    let settings = Settings::resolve(&overrides)?;
    tracing::debug!(
        proxy_url = %settings.proxy_url,
        user_id = %settings.user_id,
        "settings resolved"
    );

    commands::run(cli.command, &commands::Context { settings, format })
}

/// Logs go to stderr so stdout stays parseable. `CASEGEN_LOG` takes a full
/// filter directive and wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("CASEGEN_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
}
