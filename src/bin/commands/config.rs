use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use sqlite_upgrade::lens::utils::OutputFormat;
use sqlite_upgrade::UpgradeConfig;
use std::path::{Path, PathBuf};

use super::print_json;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    #[clap(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a commented configuration template
    Init {
        /// Where to write the template, by default $HOME/.sqlite-upgrade/config.toml
        #[clap(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config_file: Option<String>,
    config_file_exists: bool,
    #[serde(flatten)]
    settings: &'a UpgradeConfig,
}

pub fn run(config: &UpgradeConfig, args: ConfigArgs, output_format: OutputFormat) -> Result<()> {
    match args.command {
        Some(ConfigCommands::Init { path }) => init(path),
        None => show(config, output_format),
    }
}

fn init(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => UpgradeConfig::config_file_path()
            .ok_or_else(|| anyhow!("Unable to determine home directory"))?,
    };
    UpgradeConfig::write_template(&path)?;
    eprintln!("Configuration template written to {}", path.display());
    Ok(())
}

fn show(config: &UpgradeConfig, output_format: OutputFormat) -> Result<()> {
    let config_file = UpgradeConfig::config_file_path();
    let config_file_exists = config_file.as_deref().is_some_and(Path::exists);

    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: config_file.map(|p| p.to_string_lossy().to_string()),
            config_file_exists,
            settings: config,
        };
        return print_json(&info, output_format);
    }

    let config_file = match config_file {
        Some(p) if config_file_exists => p.to_string_lossy().to_string(),
        Some(p) => format!("{} (not found)", p.to_string_lossy()),
        None => "(no home directory)".to_string(),
    };
    println!("Config File:    {}", config_file);
    println!("{}", config.summary());
    Ok(())
}
