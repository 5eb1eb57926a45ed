//! Configuration management for simphon tools.
//!
//! Configuration is stored in ~/.simphon/{app_name}/config.yaml. The file is
//! optional: a missing default file yields the built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simphon_lsh::RankConfig;

use crate::output::OutputFormat;
use crate::paths::Paths;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Ranking parameters, stored at the top level of the file.
    #[serde(flatten)]
    pub rank: RankConfig,

    /// Feature table file (YAML or JSON). The embedded table is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<PathBuf>,

    /// Default output format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Paths::new(app_name).ok().map(|p| p.config_file())
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Loads configuration for the specified app.
///
/// An explicit `custom_path` must exist. The default path may be missing, in
/// which case the defaults are returned.
pub fn load_config(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = resolve_path(app_name, custom_path)?;

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config file {}: {}", config_path.display(), e))?
    } else if custom_path.is_some() {
        anyhow::bail!("config file not found: {}", config_path.display());
    } else {
        Config::default()
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Saves configuration to the specified path, or the app's default path.
pub fn save_config(app_name: &str, config: &Config, custom_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let config_path = resolve_path(app_name, custom_path)?;
    write_config(&config_path, config)?;
    Ok(config_path)
}

fn resolve_path(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match custom_path {
        Some(p) => Ok(p.to_path_buf()),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path")),
    }
}

fn write_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simphon_lsh::{ModeName, StrategyName};
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "bits: 64\nmode: ngram\nngram: 2\nformat: json\n").unwrap();

        let cfg = load_config("simphon", Some(&path)).unwrap();
        assert_eq!(cfg.app_name, "simphon");
        assert_eq!(cfg.path(), path.as_path());
        assert_eq!(cfg.rank.bits, 64);
        assert_eq!(cfg.rank.mode, ModeName::Ngram);
        assert_eq!(cfg.rank.ngram, 2);
        assert_eq!(cfg.rank.window, 1);
        assert_eq!(cfg.rank.strategy, StrategyName::Exhaustive);
        assert_eq!(cfg.format, Some(OutputFormat::Json));
        assert!(cfg.features.is_none());
    }

    #[test]
    fn test_missing_custom_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(load_config("simphon", Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "bits: [1, 2\n").unwrap();
        assert!(load_config("simphon", Some(&path)).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut cfg = Config::default();
        cfg.rank.window = 10;
        cfg.rank.strategy = StrategyName::Rotations;
        cfg.features = Some(PathBuf::from("features.json"));

        let saved = save_config("simphon", &cfg, Some(&path)).unwrap();
        assert_eq!(saved, path);

        let loaded = load_config("simphon", Some(&path)).unwrap();
        assert!(loaded.path().is_file());
        assert_eq!(loaded.rank, cfg.rank);
        assert_eq!(loaded.features, cfg.features);
        assert_eq!(loaded.format, None);
    }

    #[test]
    fn test_out_of_range_values_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "bits: 100\nwindow: 0\n").unwrap();

        let cfg = load_config("simphon", Some(&path)).unwrap();
        assert!(cfg.rank.validate().is_err());
    }
}
