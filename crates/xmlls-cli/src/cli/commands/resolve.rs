//! `xmlls resolve` - Show which server binary would run.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use xmlls::launch::{BinarySource, Resolution};

use super::Context;
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context) -> Result<()> {
    let resolver = ctx.resolver();
    let resolution = resolver.resolve();
    let download_url = ctx.download_url()?;

    match ctx.output_format {
        OutputFormat::Json => {
            let value = match &resolution {
                Resolution::Found { path, source } => json!({
                    "status": "found",
                    "path": path,
                    "source": source_name(*source),
                }),
                Resolution::NeedsDownload { install_path } => json!({
                    "status": "missing",
                    "install_path": install_path,
                    "download_url": download_url,
                }),
            };
            print_json(&value)?;
        }
        OutputFormat::Pretty => {
            println!("{} {}", "Platform:".bold(), ctx.platform().download_key().cyan());
            println!("{} {}", "Server home:".bold(), resolver.server_home().display());
            match &resolution {
                Resolution::Found { path, source } => {
                    println!("{} {} ({})", "Binary:".bold(), path.display(), source_name(*source));
                }
                Resolution::NeedsDownload { install_path } => {
                    println!("{} {}", "Binary:".bold(), "not installed".yellow());
                    println!("  {} {}", "Install path:".bold(), install_path.display());
                    match &download_url {
                        Some(url) => println!("  {} {}", "Download from:".bold(), url),
                        None => println!(
                            "  {} no download location; set one with {}",
                            "Download from:".bold(),
                            "xmlls config set download_url <URL>".cyan()
                        ),
                    }
                }
            }
        }
    }

    Ok(())
}

const fn source_name(source: BinarySource) -> &'static str {
    match source {
        BinarySource::UserOverride => "binary_path setting",
        BinarySource::Installed => "installed",
    }
}
