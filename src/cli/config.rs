use crate::cli::args::{ConfigCliArgs, ConfigCommand};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::path::Path;

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Init { force } => handle_init(force),
        ConfigCommand::Show => handle_show(),
    }
}

fn handle_init(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    write_default_config(&path, force)?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  Set gemini.api_key (or GEMINI_API_KEY) before running `recap serve`");
    println!("  Set email.user and email.app_password to enable /api/send-email");
    Ok(())
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("Failed to render config")?;

    println!();
    println!("Effective Configuration");
    println!("=======================");
    println!();
    println!("{}", rendered.trim_end());
    println!();
    println!("Config file:  {}", Config::config_path()?.display());
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite it.",
            path.display()
        );
    }

    Config::default().save_to(path)
}
