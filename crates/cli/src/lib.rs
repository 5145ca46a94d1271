pub mod commands;

use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use enrollo_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::apply::ApplyArgs;
use crate::commands::SelectionArgs;

#[derive(Debug, Parser)]
#[command(
    name = "enrollo",
    about = "Enrollo enrollment wizard CLI",
    long_about = "Browse the lesson catalog, quote bundles, submit applications, inspect config.",
    after_help = concat!(
        "Examples:\n",
        "  enrollo catalog --currency KWD\n",
        "  enrollo quote --category main --bundle main-10\n",
        "  enrollo config"
    )
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List categories and bundles with resolved prices")]
    Catalog {
        #[arg(long, help = "Display currency code (unknown codes fall back to USD)")]
        currency: Option<String>,
    },
    #[command(about = "Resolve the price and schedule requirement for one bundle")]
    Quote(SelectionArgs),
    #[command(about = "Walk the full wizard and submit an application")]
    Apply(ApplyArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Catalog { currency } => commands::catalog::run(currency.as_deref()),
        Command::Quote(selection) => commands::quote::run(selection),
        Command::Apply(args) => commands::apply::run(args),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber from config. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_logging() -> anyhow::Result<()> {
    let config = AppConfig::load(LoadOptions::default())
        .context("configuration is invalid; logging left at defaults")?;
    install_subscriber(&config.logging)
}

fn install_subscriber(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(logging.level.trim())
        .with_context(|| format!("invalid log level `{}`", logging.level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
