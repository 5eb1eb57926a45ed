//! Pair ranking commands.

use std::path::PathBuf;

use clap::Args;
use simphon_lsh::{Ranker, SimphonError, Token};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{feature_table, get_config, load_corpus, load_token_file, output, rank_config, report_warnings};
use crate::Cli;

/// Rank every unordered pair of corpus tokens.
#[derive(Args)]
pub struct CompareCommand {}

/// Rank query tokens against every corpus token.
#[derive(Args)]
pub struct SearchCommand {
    /// Query token file (YAML or JSON)
    #[arg(short = 'q', long)]
    queries: PathBuf,
}

impl CompareCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let corpus = load_corpus(cli)?;
        run_ranking(cli, corpus, Vec::new()).await
    }
}

impl SearchCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let corpus = load_corpus(cli)?;
        let queries = load_token_file(&self.queries)?;
        run_ranking(cli, corpus, queries).await
    }
}

/// Ranks on a blocking thread while Ctrl+C cancels the run. Nothing is
/// written unless the ranking completes.
async fn run_ranking(cli: &Cli, corpus: Vec<Token>, queries: Vec<Token>) -> anyhow::Result<()> {
    let cfg = get_config(cli)?;
    let table = feature_table(cli, &cfg)?;
    let rank = rank_config(&cfg.rank, &cli.rank);
    let out = output(cli, &cfg);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling");
                cancel.cancel();
            }
        })
    };

    let job = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let ranker = Ranker::new(&table, &rank)?.with_cancellation(cancel);
        let ranking = ranker.rank_with_progress(&corpus, &queries, |p| {
            debug!(done = p.done, total = p.total, "progress");
        })?;
        report_warnings(&ranking.warnings);
        out.write_records(&ranking.results)
    });

    let result = job.await;
    interrupt.abort();

    match result? {
        Err(e) if matches!(e.downcast_ref::<SimphonError>(), Some(SimphonError::Cancelled)) => {
            anyhow::bail!("ranking cancelled, no results written")
        }
        other => other,
    }
}
