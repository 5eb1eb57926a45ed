//! Utility functions for CLI commands.

use std::path::Path;

use simphon_cli::{load_config, load_feature_table, load_tokens, parse_tokens_yaml, Config, Output};
use simphon_lsh::{DataQualityWarning, MapFeatureTable, RankConfig, Token};
use tracing::{debug, warn};

use crate::{Cli, RankArgs};

pub const APP_NAME: &str = "simphon";

const DEMO_TOKENS: &str = include_str!("../demo_tokens.yaml");

/// Gets the configuration file, or the defaults when none exists.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Merges command line overrides into the configured ranking parameters.
pub fn rank_config(base: &RankConfig, args: &RankArgs) -> RankConfig {
    RankConfig {
        bits: args.bits.unwrap_or(base.bits),
        mode: args.mode.unwrap_or(base.mode),
        ngram: args.ngram.unwrap_or(base.ngram),
        window: args.window.unwrap_or(base.window),
        seed: args.seed.unwrap_or(base.seed),
        strategy: args.strategy.unwrap_or(base.strategy),
        span: args.span.unwrap_or(base.span),
    }
}

/// Loads the feature table named by `--features` or the config file, or
/// the embedded table.
pub fn feature_table(cli: &Cli, cfg: &Config) -> anyhow::Result<MapFeatureTable> {
    match cli.features.as_deref().or(cfg.features.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading feature table");
            Ok(load_feature_table(path)?)
        }
        None => Ok(MapFeatureTable::default_table()),
    }
}

/// Loads the corpus from `-f`, or the built-in names list.
pub fn load_corpus(cli: &Cli) -> anyhow::Result<Vec<Token>> {
    match cli.input.as_deref() {
        Some(path) => load_token_file(path),
        None => demo_tokens(),
    }
}

/// Loads tokens from a YAML or JSON file.
pub fn load_token_file(path: &Path) -> anyhow::Result<Vec<Token>> {
    let tokens = load_tokens(path)
        .map_err(|e| anyhow::anyhow!("failed to load tokens from {}: {}", path.display(), e))?;
    debug!(path = %path.display(), tokens = tokens.len(), "loaded tokens");
    Ok(tokens)
}

/// The built-in list of English names.
pub fn demo_tokens() -> anyhow::Result<Vec<Token>> {
    Ok(parse_tokens_yaml(DEMO_TOKENS)?)
}

/// Builds the output target from flags and config.
pub fn output(cli: &Cli, cfg: &Config) -> Output {
    Output::new(
        cli.format.or(cfg.format).unwrap_or_default(),
        cli.output.clone(),
    )
}

/// Logs a one-line summary of data-quality warnings.
pub fn report_warnings(warnings: &[DataQualityWarning]) {
    if warnings.is_empty() {
        return;
    }
    let mut phonemes: Vec<&str> = warnings.iter().map(|w| w.phoneme.as_str()).collect();
    phonemes.sort_unstable();
    phonemes.dedup();
    warn!(
        count = warnings.len(),
        phonemes = %phonemes.join(" "),
        "phonemes missing from the feature table were encoded as neutral rows"
    );
}
