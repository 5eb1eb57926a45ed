//! Configuration file commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use simphon_cli::{load_config, save_config, Config};

use super::{get_config, rank_config, APP_NAME};
use crate::Cli;

/// Manage the config file.
///
/// Configuration is stored in ~/.simphon/simphon/config.yaml unless --config
/// names another file.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Show the effective configuration, flags applied
    View,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::View => {
                let cfg = apply_flags(cli, get_config(cli)?)?;
                super::output(cli, &cfg).write(&cfg)
            }
            ConfigSubcommand::Init { force } => {
                let path = init_config(cli, *force)?;
                eprintln!("wrote {}", path.display());
                Ok(())
            }
            ConfigSubcommand::Path => {
                let cfg = get_config(cli)?;
                println!("{}", cfg.path().display());
                Ok(())
            }
        }
    }
}

/// Writes the effective configuration. An existing file is only replaced
/// with `force`, and only if it parses.
fn init_config(cli: &Cli, force: bool) -> anyhow::Result<PathBuf> {
    let target = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path(APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };
    let base = if target.exists() {
        if !force {
            anyhow::bail!(
                "config file {} already exists, use --force to overwrite",
                target.display()
            );
        }
        load_config(APP_NAME, Some(&target))?
    } else {
        Config::default()
    };
    let cfg = apply_flags(cli, base)?;
    save_config(APP_NAME, &cfg, Some(&target))
}

/// Applies command line overrides and rejects invalid ranking values.
fn apply_flags(cli: &Cli, mut cfg: Config) -> anyhow::Result<Config> {
    cfg.rank = rank_config(&cfg.rank, &cli.rank);
    cfg.rank.validate()?;
    if cli.features.is_some() {
        cfg.features = cli.features.clone();
    }
    if cli.format.is_some() {
        cfg.format = cli.format;
    }
    Ok(cfg)
}
