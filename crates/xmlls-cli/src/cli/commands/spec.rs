//! `xmlls spec` - Print the command line the server would start with.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::SpecArgs;
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context, args: SpecArgs) -> Result<()> {
    let (_, spec) = ctx.prepare(&args.launch).await?;
    let spec = if args.show_secrets { spec } else { spec.redacted() };

    match ctx.output_format {
        OutputFormat::Json => print_json(&spec)?,
        OutputFormat::Pretty => {
            println!("{} {}", "Command:".bold(), spec.command.display().to_string().cyan());
            if !spec.args.is_empty() {
                println!("{}", "Arguments:".bold());
                for arg in &spec.args {
                    println!("  {arg}");
                }
            }
            match &spec.env {
                None => println!("{} inherited", "Environment:".bold()),
                Some(env) => {
                    println!("{} inherited, plus", "Environment:".bold());
                    for (key, value) in env {
                        println!("  {key}={value}");
                    }
                }
            }
        }
    }

    Ok(())
}
