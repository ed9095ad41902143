//! `xmlls verify` - Check a server binary against the trusted hashes.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use xmlls::launch::Resolution;
use xmlls::trust::hash::digest_file;
use xmlls::XmlLsError;

use super::Context;
use crate::cli::args::VerifyArgs;
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context, args: VerifyArgs) -> Result<()> {
    let resolver = ctx.resolver();
    let path = match args.path {
        Some(path) => path,
        None => match resolver.resolve() {
            Resolution::Found { path, .. } => path,
            Resolution::NeedsDownload { install_path } => anyhow::bail!(
                "No server binary at {}.\n\nInstall one with: xmlls fetch",
                install_path.display()
            ),
        },
    };

    let digest = digest_file(&path).await?;
    let verifier = ctx.verifier(&resolver).await?;
    let trusted = verifier.verify(&path).await;

    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({
            "path": path,
            "sha256": digest,
            "trusted": trusted,
        }))?,
        OutputFormat::Pretty => {
            println!("{} {}", "Binary:".bold(), path.display());
            println!("{} {}", "SHA-256:".bold(), digest.dimmed());
            if trusted {
                println!("{} {}", "Status:".bold(), "trusted".green().bold());
            } else {
                println!("{} {}", "Status:".bold(), "not trusted".red().bold());
            }
        }
    }

    if !trusted {
        return Err(XmlLsError::UntrustedBinary { path }.into());
    }
    Ok(())
}
