//! `xmlls fetch` - Download the binary server.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use xmlls::launch::Resolution;

use super::Context;
use crate::cli::args::FetchArgs;
use crate::output::{print_json, OutputFormat};
use crate::ui::DownloadBar;

pub async fn execute(ctx: Context, args: FetchArgs) -> Result<()> {
    let resolver = ctx.resolver();

    let target = match resolver.resolve() {
        Resolution::Found { path, .. } if !args.force => {
            match ctx.output_format {
                OutputFormat::Json => print_json(&json!({ "path": path, "downloaded": false }))?,
                OutputFormat::Pretty => println!(
                    "{} {} (use --force to download again)",
                    "Already installed:".green().bold(),
                    path.display()
                ),
            }
            return Ok(());
        }
        Resolution::Found { .. } => resolver.descriptor().install_path.clone(),
        Resolution::NeedsDownload { install_path } => install_path,
    };

    let url = match args.url {
        Some(url) => url,
        None => ctx.download_url()?.ok_or_else(|| {
            anyhow::anyhow!(
                "No download location for {}.\n\n\
                 Set one with one of:\n  \
                 1. --url <URL>\n  \
                 2. xmlls config set download_url <URL>\n  \
                 3. xmlls config set download_manifest <FILE>",
                ctx.platform().download_key()
            )
        })?,
    };

    let bar = Arc::new(DownloadBar::new(format!("Downloading {}", resolver.descriptor().file_name())));
    let fetcher = ctx.fetcher(bar)?;
    let path = fetcher.fetch(&url, &target, &ctx.interrupt).await?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({ "path": path, "downloaded": true, "url": url }))?,
        OutputFormat::Pretty => {
            println!("{} {}", "Installed:".green().bold(), path.display());
            println!("Run {} to check it before first use.", "xmlls verify".cyan());
        }
    }

    Ok(())
}
