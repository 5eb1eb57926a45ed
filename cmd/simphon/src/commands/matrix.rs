//! Feature matrix display.

use clap::Args;
use serde::Serialize;
use simphon_lsh::{Encoder, EncodingMode, Ranker, Token};

use super::{feature_table, get_config, load_corpus, output, rank_config, report_warnings};
use crate::Cli;

/// Print the feature matrix of a corpus token, one row per phoneme.
#[derive(Args)]
pub struct MatrixCommand {
    /// Graphemes of the token to show; every token with these graphemes is printed
    graphemes: String,

    /// Show the rows used for hashing under the configured mode instead of
    /// one row per phoneme
    #[arg(long)]
    encoded: bool,
}

#[derive(Debug, Serialize)]
struct MatrixView<'a> {
    token: &'a Token,
    columns: &'a [String],
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Serialize)]
struct MatrixRow {
    label: String,
    values: Vec<i32>,
}

impl MatrixCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let table = feature_table(cli, &cfg)?;
        let ranker = Ranker::new(&table, &rank_config(&cfg.rank, &cli.rank))?;
        let encoder = ranker.encoder();

        let corpus = load_corpus(cli)?;
        let tokens: Vec<&Token> = corpus
            .iter()
            .filter(|t| t.graphemes() == self.graphemes)
            .collect();
        if tokens.is_empty() {
            anyhow::bail!("no token with graphemes '{}' in the corpus", self.graphemes);
        }

        let columns = encoder.column_names();
        let mut views = Vec::with_capacity(tokens.len());
        let mut warnings = Vec::new();
        for token in tokens {
            let encoded = if self.encoded {
                encoder.encode(token)?
            } else {
                encoder.phoneme_matrix(token)?
            };
            warnings.extend(encoded.warnings);
            let labels = row_labels(token, encoder, self.encoded);
            let rows = labels
                .into_iter()
                .zip(encoded.matrix.iter_rows())
                .map(|(label, values)| MatrixRow {
                    label,
                    values: values.to_vec(),
                })
                .collect();
            views.push(MatrixView {
                token,
                columns: &columns,
                rows,
            });
        }
        report_warnings(&warnings);

        let mut header = vec!["token".to_string(), "row".to_string()];
        header.extend(columns.iter().cloned());
        let grid: Vec<Vec<String>> = views
            .iter()
            .flat_map(|v| {
                v.rows.iter().map(move |r| {
                    let mut cells = vec![v.token.to_string(), r.label.clone()];
                    cells.extend(r.values.iter().map(i32::to_string));
                    cells
                })
            })
            .collect();

        output(cli, &cfg).write_grid(&header, &grid, &views)
    }
}

/// Labels each matrix row with the phonemes it covers.
fn row_labels(token: &Token, encoder: &Encoder<'_>, encoded: bool) -> Vec<String> {
    let phonemes = token.phonemes();
    match encoder.mode() {
        EncodingMode::NGram(n) if encoded => {
            let width = n.min(phonemes.len());
            phonemes.windows(width).map(|w| w.join(" ")).collect()
        }
        _ => phonemes.to_vec(),
    }
}
