//! `xmlls trust` - Manage the trusted binary hashes.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use xmlls::trust::hash::{digest_file, parse_digest};

use super::Context;
use crate::cli::args::{TrustArgs, TrustCommands};
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context, args: TrustArgs) -> Result<()> {
    match args.command {
        TrustCommands::List => list(ctx).await,
        TrustCommands::Add { target } => add(ctx, &target).await,
    }
}

async fn list(ctx: Context) -> Result<()> {
    let store = ctx.trust_store().await?;
    let hashes = store.hashes().await;

    match ctx.output_format {
        OutputFormat::Json => print_json(&hashes)?,
        OutputFormat::Pretty => {
            if hashes.is_empty() {
                println!("{}", "No trusted binaries yet.".dimmed());
            }
            for hash in &hashes {
                println!("{hash}");
            }
            if ctx.verbose {
                println!();
                println!("{} {}", "Stored in:".bold(), ctx.paths.trust_file.display());
            }
        }
    }
    Ok(())
}

/// A 64-character hex argument is taken as a digest, anything else as a path.
async fn add(ctx: Context, target: &str) -> Result<()> {
    let digest = match parse_digest(target) {
        Some(digest) => digest,
        None => digest_file(Path::new(target)).await?,
    };

    let store = ctx.trust_store().await?;
    let added = store.add(&digest).await?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({ "sha256": digest, "added": added }))?,
        OutputFormat::Pretty => {
            if added {
                println!("{} {}", "Trusted:".green().bold(), digest);
            } else {
                println!("{} {}", "Already trusted:".bold(), digest);
            }
        }
    }
    Ok(())
}
