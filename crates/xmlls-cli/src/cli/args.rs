//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Host for the LemMinX XML language server
///
/// Installs the native server binary, checks it against your trusted
/// hashes, falls back to the Java server when needed, and runs it.
/// Point your editor's XML language server command at `xmlls run`.
#[derive(Parser, Debug)]
#[command(name = "xmlls")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(long, env = "XMLLS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which server binary would run, or where it would be installed
    Resolve,

    /// Download the binary server
    Fetch(FetchArgs),

    /// Check whether a server binary is trusted, asking if it is not
    Verify(VerifyArgs),

    /// Manage the trusted binary hashes
    Trust(TrustArgs),

    /// Print the command line the server would be started with
    Spec(SpecArgs),

    /// Run the server, bridged to this process's stdin and stdout
    Run(RunArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Fetch command
// ============================================================================

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Download from this URL instead of the configured location
    #[arg(long)]
    pub url: Option<String>,

    /// Download even if a binary is already installed
    #[arg(short, long)]
    pub force: bool,
}

// ============================================================================
// Verify command
// ============================================================================

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Binary to verify (default: the resolved server binary)
    pub path: Option<PathBuf>,
}

// ============================================================================
// Trust command
// ============================================================================

#[derive(Args, Debug)]
pub struct TrustArgs {
    #[command(subcommand)]
    pub command: TrustCommands,
}

#[derive(Subcommand, Debug)]
pub enum TrustCommands {
    /// List trusted hashes
    List,

    /// Trust a binary, or a SHA-256 digest given as hex
    Add {
        /// Path to a binary, or a 64-character hex digest
        target: String,
    },
}

// ============================================================================
// Spec and run commands
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct LaunchArgs {
    /// Only try the binary server
    #[arg(long, conflicts_with = "java")]
    pub binary: bool,

    /// Only try the Java server
    #[arg(long)]
    pub java: bool,
}

#[derive(Args, Debug)]
pub struct SpecArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,

    /// Show secrets in the environment and arguments
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value (an empty value clears it)
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn launch_flags_conflict() {
        assert!(Cli::try_parse_from(["xmlls", "run", "--binary", "--java"]).is_err());
        let cli = Cli::try_parse_from(["xmlls", "spec", "--java", "-o", "json"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Spec(SpecArgs { launch: LaunchArgs { java: true, .. }, .. })));
    }
}
