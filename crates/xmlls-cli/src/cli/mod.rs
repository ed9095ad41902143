//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Paths};
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let paths = Paths::resolve(cli.config.as_deref())?;
    let config = Config::load(&paths.config_file)?;

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    // Create context for commands
    let ctx = commands::Context {
        config,
        paths,
        output_format,
        verbose: cli.verbose,
        interrupt: commands::interrupt_token(),
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Resolve => commands::resolve::execute(ctx).await,
        Commands::Fetch(args) => commands::fetch::execute(ctx, args).await,
        Commands::Verify(args) => commands::verify::execute(ctx, args).await,
        Commands::Trust(args) => commands::trust::execute(ctx, args).await,
        Commands::Spec(args) => commands::spec::execute(ctx, args).await,
        Commands::Run(args) => commands::run::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}

/// Logs go to stderr; stdout belongs to the language server under `run`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("XMLLS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
