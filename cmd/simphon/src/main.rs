//! simphon - rank tokens by phonetic similarity.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use simphon_cli::OutputFormat;
use simphon_lsh::{ModeName, StrategyName};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    CompareCommand, ConfigCommand, FingerprintCommand, MatrixCommand, SearchCommand,
};

/// simphon - rank tokens by phonetic similarity.
///
/// Tokens are encoded as articulatory feature matrices, hashed into simhash
/// fingerprints and ranked by Hamming distance.
///
/// Defaults can be stored in ~/.simphon/simphon/config.yaml; flags override them.
#[derive(Parser)]
#[command(name = "simphon")]
#[command(about = "Phonetic similarity ranking with simhash fingerprints")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.simphon/simphon/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Feature table file (YAML or JSON)
    #[arg(long, global = true)]
    pub features: Option<PathBuf>,

    /// Token file (YAML or JSON); the built-in names list is used when omitted
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,

    /// Output format: tsv, json or yaml
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub rank: RankArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Ranking overrides. Unset flags keep the config file's values.
#[derive(Args, Debug, Default)]
pub struct RankArgs {
    /// Fingerprint size in bits: 32, 64, 128 or 256
    #[arg(short = 'b', long, global = true)]
    pub bits: Option<i64>,

    /// Encoding mode
    #[arg(long, global = true, value_parser = parse_mode)]
    pub mode: Option<ModeName>,

    /// N-gram size (with --mode ngram)
    #[arg(short = 'n', long, global = true, allow_negative_numbers = true)]
    pub ngram: Option<i64>,

    /// Refinement window size; 1 disables refinement
    #[arg(short = 'w', long, global = true, allow_negative_numbers = true)]
    pub window: Option<i64>,

    /// Hyperplane seed
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Candidate strategy
    #[arg(long, global = true, value_parser = parse_strategy)]
    pub strategy: Option<StrategyName>,

    /// Neighbour span for the rotations strategy
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub span: Option<i64>,
}

fn parse_mode(s: &str) -> Result<ModeName, String> {
    match s.to_lowercase().as_str() {
        "whole" => Ok(ModeName::Whole),
        "ngram" => Ok(ModeName::Ngram),
        other => Err(format!("unknown mode '{other}' (expected whole or ngram)")),
    }
}

fn parse_strategy(s: &str) -> Result<StrategyName, String> {
    match s.to_lowercase().as_str() {
        "exhaustive" => Ok(StrategyName::Exhaustive),
        "rotations" => Ok(StrategyName::Rotations),
        other => Err(format!(
            "unknown strategy '{other}' (expected exhaustive or rotations)"
        )),
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank every pair of corpus tokens
    Compare(CompareCommand),
    /// Rank query tokens against the corpus
    Search(SearchCommand),
    /// Print each token's fingerprint
    Fingerprint(FingerprintCommand),
    /// Print a token's feature matrix
    Matrix(MatrixCommand),
    /// Manage the config file
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Compare(cmd) => cmd.run(&cli).await,
        Commands::Search(cmd) => cmd.run(&cli).await,
        Commands::Fingerprint(cmd) => cmd.run(&cli),
        Commands::Matrix(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_rank_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "simphon", "compare", "-b", "64", "--mode", "ngram", "-n", "2", "-w", "10",
            "--strategy", "rotations", "--span", "4", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.rank.bits, Some(64));
        assert_eq!(cli.rank.mode, Some(ModeName::Ngram));
        assert_eq!(cli.rank.ngram, Some(2));
        assert_eq!(cli.rank.window, Some(10));
        assert_eq!(cli.rank.strategy, Some(StrategyName::Rotations));
        assert_eq!(cli.rank.span, Some(4));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Compare(_)));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["simphon", "--mode", "trigram", "compare"]).is_err());
    }

    #[test]
    fn search_requires_queries() {
        assert!(Cli::try_parse_from(["simphon", "search"]).is_err());
        let cli = Cli::try_parse_from(["simphon", "search", "-q", "q.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Search(_)));
    }
}
