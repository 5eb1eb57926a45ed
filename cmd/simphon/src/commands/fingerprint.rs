//! Fingerprint listing.

use clap::Args;
use serde::Serialize;
use simphon_cli::Tabular;
use simphon_lsh::{Ranker, Token};

use super::{feature_table, get_config, load_corpus, output, rank_config, report_warnings};
use crate::Cli;

/// Print the fingerprint of every corpus token.
#[derive(Args)]
pub struct FingerprintCommand {}

#[derive(Debug, Serialize)]
struct FingerprintRow<'a> {
    #[serde(flatten)]
    token: &'a Token,
    bits: usize,
    fingerprint: String,
}

impl Tabular for FingerprintRow<'_> {
    fn header() -> Vec<&'static str> {
        vec!["language", "graphemes", "phonemes", "bits", "fingerprint"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.token.language().to_string(),
            self.token.graphemes().to_string(),
            self.token.phonemes().join(" "),
            self.bits.to_string(),
            self.fingerprint.clone(),
        ]
    }
}

impl FingerprintCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let table = feature_table(cli, &cfg)?;
        let ranker = Ranker::new(&table, &rank_config(&cfg.rank, &cli.rank))?;

        let tokens = load_corpus(cli)?;
        let fingerprinted = ranker.fingerprint_all(&tokens)?;

        let mut warnings = Vec::new();
        let rows: Vec<FingerprintRow<'_>> = tokens
            .iter()
            .zip(fingerprinted)
            .map(|(token, f)| {
                warnings.extend(f.warnings);
                FingerprintRow {
                    token,
                    bits: f.fingerprint.bits(),
                    fingerprint: f.fingerprint.to_hex(),
                }
            })
            .collect();

        report_warnings(&warnings);
        output(cli, &cfg).write_records(&rows)
    }
}
