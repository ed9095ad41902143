//! `xmlls config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::{Config, KEYS};
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => show_path(&ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => {
            let mut shown = config.clone();
            if shown.proxy_authorization.is_some() {
                shown.proxy_authorization = Some("****".to_string());
            }
            print_json(&shown)?;
        }
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();

            let not_set = || "(not set)".dimmed().to_string();
            let optional = |v: &Option<String>| v.clone().unwrap_or_else(not_set);
            let text = |v: &str| if v.is_empty() { not_set() } else { v.to_string() };

            for (key, _) in KEYS {
                let value = match key {
                    "server_home" => format!("{}", config.server_home(&ctx.paths).display()),
                    "binary_path" => optional(&config.binary_path),
                    "binary_args" => text(&config.binary_args),
                    "vmargs" => text(&config.vmargs),
                    "java_home" => optional(&config.java_home),
                    "prefer_binary" => config.prefer_binary.to_string(),
                    "silence_extension_warning" => config.silence_extension_warning.to_string(),
                    "extension_jars" => text(&config.extension_jars.join(", ")),
                    "proxy" => optional(&config.proxy),
                    // credentials never printed
                    "proxy_authorization" => config
                        .proxy_authorization
                        .as_ref()
                        .map_or_else(not_set, |_| "****".to_string()),
                    "download_url" => optional(&config.download_url),
                    "download_manifest" => optional(&config.download_manifest),
                    "output_format" => config.output_format.unwrap_or_default().to_string(),
                    _ => continue,
                };
                println!("  {} {}", format!("{key}:").bold(), value);
            }
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load(&ctx.paths.config_file)?;
    config.set(key, value)?;
    config.save(&ctx.paths.config_file)?;

    if value.is_empty() {
        println!("{} {} cleared.", "Success:".green().bold(), key.cyan());
    } else {
        println!("{} {} set.", "Success:".green().bold(), key.cyan());
    }

    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.paths.config_file.display());
    Ok(())
}
