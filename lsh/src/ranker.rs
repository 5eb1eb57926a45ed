use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{RankConfig, RankSettings};
use crate::encoder::{DataQualityWarning, Encoder};
use crate::fingerprint::{BitSize, Fingerprint};
use crate::hasher::SimHasher;
use crate::pairs::{rotation_candidates, CandidateStrategy, PairPlan, PairSource};
use crate::table::FeatureTable;
use crate::token::Token;
use crate::SimphonError;

/// Number of pairs compared between cancellation checks and progress events.
pub const BATCH_SIZE: usize = 4096;

/// One compared pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairResult<'a> {
    pub token_a: &'a Token,
    pub token_b: &'a Token,
    /// Number of differing fingerprint bits, in `[0, bits]`.
    pub hamming_distance: u32,
    /// `1 - hamming_distance / bits`.
    pub similarity_score: f64,
}

impl<'a> PairResult<'a> {
    fn new(token_a: &'a Token, token_b: &'a Token, hamming_distance: u32, bits: BitSize) -> Self {
        Self {
            token_a,
            token_b,
            hamming_distance,
            similarity_score: similarity(hamming_distance, bits),
        }
    }
}

/// Similarity score for a Hamming distance: `1 - distance / bits`.
pub fn similarity(distance: u32, bits: BitSize) -> f64 {
    1.0 - distance as f64 / bits.bits() as f64
}

/// Progress of a ranking run, delivered after every batch of comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Result of [`Ranker::rank`].
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    /// Fingerprint width used for the run.
    pub bits: BitSize,
    /// Pairs ordered by ascending distance, refined per window.
    pub results: Vec<PairResult<'a>>,
    /// Phonemes the feature table did not know, in token order.
    pub warnings: Vec<DataQualityWarning>,
}

/// A token with its fingerprint.
#[derive(Debug, Clone)]
pub struct Fingerprinted {
    pub fingerprint: Fingerprint,
    pub warnings: Vec<DataQualityWarning>,
}

/// Lazy stream of comparisons for incremental consumers.
///
/// Each item is one compared pair, in pair-generation order; the stream is
/// finite, knows its length and cannot be restarted. Nothing is sorted.
pub struct Comparisons<'a> {
    tokens: Vec<&'a Token>,
    fingerprints: Vec<Fingerprint>,
    pairs: PairSource,
    bits: BitSize,
    warnings: Vec<DataQualityWarning>,
}

impl<'a> Comparisons<'a> {
    /// Data-quality warnings collected while fingerprinting.
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    fn compare(&self, (a, b): (usize, usize)) -> PairResult<'a> {
        let d = self.fingerprints[a].distance(&self.fingerprints[b]);
        PairResult::new(self.tokens[a], self.tokens[b], d, self.bits)
    }
}

impl<'a> Iterator for Comparisons<'a> {
    type Item = PairResult<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.pairs.next()?;
        Some(self.compare(pair))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pairs.size_hint()
    }
}

impl ExactSizeIterator for Comparisons<'_> {}

/// Fingerprints tokens and ranks token pairs by fingerprint distance.
///
/// The ranker holds no per-run state: every call fingerprints its tokens
/// afresh and returns owned results.
pub struct Ranker<'t> {
    encoder: Encoder<'t>,
    hasher: SimHasher,
    settings: RankSettings,
    cancel: CancellationToken,
}

impl<'t> Ranker<'t> {
    /// Creates a ranker from a raw config.
    pub fn new(table: &'t dyn FeatureTable, config: &RankConfig) -> Result<Self, SimphonError> {
        Self::with_settings(table, config.validate()?)
    }

    /// Creates a ranker from validated settings.
    pub fn with_settings(
        table: &'t dyn FeatureTable,
        settings: RankSettings,
    ) -> Result<Self, SimphonError> {
        if settings.window == 0 {
            return Err(SimphonError::InvalidWindow(0));
        }
        Ok(Self {
            encoder: Encoder::new(table, settings.mode)?,
            hasher: SimHasher::new(settings.bits, settings.seed),
            settings,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses `cancel` to abort runs cooperatively.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn encoder(&self) -> &Encoder<'t> {
        &self.encoder
    }

    /// Fingerprints one token.
    pub fn fingerprint(&self, token: &Token) -> Result<Fingerprinted, SimphonError> {
        let encoded = self.encoder.encode(token)?;
        Ok(Fingerprinted {
            fingerprint: self.hasher.fingerprint(&encoded.matrix),
            warnings: encoded.warnings,
        })
    }

    /// Fingerprints tokens in parallel, preserving input order.
    ///
    /// Every token is checked for an empty phoneme sequence before any
    /// fingerprint is computed.
    pub fn fingerprint_all<T>(&self, tokens: &[T]) -> Result<Vec<Fingerprinted>, SimphonError>
    where
        T: AsRef<Token> + Sync,
    {
        if let Some(t) = tokens.iter().map(AsRef::as_ref).find(|t| t.is_empty()) {
            return Err(SimphonError::EmptyPhonemes {
                token: t.to_string(),
            });
        }
        tokens
            .par_iter()
            .map(|t| self.fingerprint(t.as_ref()))
            .collect()
    }

    /// Ranks all corpus pairs, or queries x corpus when `queries` is not empty.
    pub fn rank<'a>(
        &self,
        corpus: &'a [Token],
        queries: &'a [Token],
    ) -> Result<Ranking<'a>, SimphonError> {
        self.rank_with_progress(corpus, queries, |_| {})
    }

    /// Like [`Ranker::rank`], reporting progress after every batch.
    ///
    /// Distances are computed in parallel batches of [`BATCH_SIZE`] pairs.
    /// The cancellation token is checked before each batch; a cancelled run
    /// returns [`SimphonError::Cancelled`] and drops all partial results.
    pub fn rank_with_progress<'a, F>(
        &self,
        corpus: &'a [Token],
        queries: &'a [Token],
        mut on_progress: F,
    ) -> Result<Ranking<'a>, SimphonError>
    where
        F: FnMut(Progress),
    {
        let mut stream = self.comparisons(corpus, queries)?;
        let total = stream.len();
        debug!(
            corpus = corpus.len(),
            queries = queries.len(),
            pairs = total,
            "comparing pairs"
        );

        let mut results: Vec<PairResult<'a>> = Vec::with_capacity(total);
        loop {
            if self.cancel.is_cancelled() {
                debug!(done = results.len(), total, "ranking cancelled");
                return Err(SimphonError::Cancelled);
            }
            let batch: Vec<(usize, usize)> = stream.pairs.by_ref().take(BATCH_SIZE).collect();
            if batch.is_empty() {
                break;
            }
            let s = &stream;
            results.par_extend(batch.par_iter().map(|&pair| s.compare(pair)));
            on_progress(Progress {
                done: results.len(),
                total,
            });
        }

        sort_by_distance(&mut results);
        refine_windows(&mut results, self.settings.window);
        debug!(results = results.len(), window = self.settings.window, "ranking sorted");

        Ok(Ranking {
            bits: self.settings.bits,
            results,
            warnings: stream.warnings,
        })
    }

    /// Fingerprints the tokens and returns the unsorted comparison stream.
    pub fn comparisons<'a>(
        &self,
        corpus: &'a [Token],
        queries: &'a [Token],
    ) -> Result<Comparisons<'a>, SimphonError> {
        if (queries.is_empty() && corpus.len() < 2) || corpus.is_empty() {
            return Err(SimphonError::NothingToRank {
                corpus: corpus.len(),
                queries: queries.len(),
            });
        }
        if self.cancel.is_cancelled() {
            return Err(SimphonError::Cancelled);
        }

        let tokens: Vec<&'a Token> = corpus.iter().chain(queries.iter()).collect();
        let fingerprinted = self.fingerprint_all(&tokens)?;

        let mut fingerprints = Vec::with_capacity(fingerprinted.len());
        let mut warnings = Vec::new();
        for f in fingerprinted {
            fingerprints.push(f.fingerprint);
            warnings.extend(f.warnings);
        }

        let pairs = match self.settings.strategy {
            CandidateStrategy::Exhaustive if queries.is_empty() => {
                PairSource::Plan(PairPlan::all_pairs(corpus.len()))
            }
            CandidateStrategy::Exhaustive => {
                PairSource::Plan(PairPlan::cross(queries.len(), corpus.len()))
            }
            CandidateStrategy::Rotations { span } => {
                let listed = rotation_candidates(&fingerprints, corpus.len(), span);
                debug!(candidates = listed.len(), span, "rotation candidates");
                PairSource::Listed(listed.into_iter())
            }
        };

        Ok(Comparisons {
            tokens,
            fingerprints,
            pairs,
            bits: self.settings.bits,
            warnings,
        })
    }
}

/// Stable sort by ascending distance; equal distances keep their order.
pub fn sort_by_distance(results: &mut [PairResult<'_>]) {
    results.sort_by_key(|r| r.hamming_distance);
}

/// Re-sorts each consecutive, non-overlapping window of `window` results by
/// `(distance, token_a, token_b)`. Results never cross a window boundary.
/// A window of 1 leaves the order untouched.
pub fn refine_windows(results: &mut [PairResult<'_>], window: usize) {
    if window <= 1 {
        return;
    }
    for chunk in results.chunks_mut(window) {
        chunk.sort_by(refine_order);
    }
}

fn refine_order(x: &PairResult<'_>, y: &PairResult<'_>) -> Ordering {
    x.hamming_distance
        .cmp(&y.hamming_distance)
        .then_with(|| x.token_a.cmp(y.token_a))
        .then_with(|| x.token_b.cmp(y.token_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModeName, StrategyName};
    use crate::table::MapFeatureTable;

    fn names() -> Vec<Token> {
        vec![
            Token::new("eng", "Alex", ["æ", "l", "ə", "k", "s"]),
            Token::new("eng", "Alexander", ["æ", "l", "ə", "k", "z", "æ", "n", "d", "ɚ"]),
            Token::new("eng", "Brad", ["b", "ɹ", "æ", "d"]),
            Token::new("eng", "Bradley", ["b", "ɹ", "æ", "d", "l", "i"]),
            Token::new("eng", "Kat", ["k", "æ", "t"]),
            Token::new("eng", "Matt", ["m", "æ", "t"]),
            Token::new("eng", "Zach", ["z", "æ", "k"]),
            Token::new("eng", "Zak", ["z", "æ", "k"]),
        ]
    }

    fn token(graphemes: &str) -> Token {
        Token::new("eng", graphemes, ["k"])
    }

    #[test]
    fn identical_phonemes_rank_first() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = names();
        let ranking = ranker.rank(&corpus, &[]).unwrap();

        assert_eq!(ranking.results.len(), 28);
        let first = &ranking.results[0];
        assert_eq!(first.hamming_distance, 0);
        assert_eq!(first.similarity_score, 1.0);
        assert_eq!(first.token_a.graphemes(), "Zach");
        assert_eq!(first.token_b.graphemes(), "Zak");
    }

    #[test]
    fn results_are_sorted_and_bounded() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = names();
        let ranking = ranker.rank(&corpus, &[]).unwrap();

        for w in ranking.results.windows(2) {
            assert!(w[0].hamming_distance <= w[1].hamming_distance);
        }
        for r in &ranking.results {
            assert!(r.hamming_distance <= 128);
            assert_eq!(r.similarity_score, 1.0 - r.hamming_distance as f64 / 128.0);
        }
    }

    #[test]
    fn queries_rank_against_corpus() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = names();
        let queries = vec![Token::new("eng", "Zack", ["z", "æ", "k"])];
        let ranking = ranker.rank(&corpus, &queries).unwrap();

        assert_eq!(ranking.results.len(), corpus.len());
        assert!(ranking.results.iter().all(|r| r.token_a.graphemes() == "Zack"));
        assert_eq!(ranking.results[0].hamming_distance, 0);
    }

    #[test]
    fn progress_reaches_total() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = names();
        let mut events = Vec::new();
        ranker
            .rank_with_progress(&corpus, &[], |p| events.push(p))
            .unwrap();

        let last = events.last().unwrap();
        assert_eq!(last.done, 28);
        assert_eq!(last.total, 28);
    }

    #[test]
    fn comparisons_stream_is_lazy_and_sized() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = names();
        let mut stream = ranker.comparisons(&corpus, &[]).unwrap();

        assert_eq!(stream.len(), 28);
        let first = stream.next().unwrap();
        assert_eq!(first.token_a.graphemes(), "Alex");
        assert_eq!(first.token_b.graphemes(), "Alexander");
        assert_eq!(stream.len(), 27);
        assert_eq!(stream.count(), 27);
    }

    #[test]
    fn cancelled_run_returns_no_results() {
        let table = MapFeatureTable::default_table();
        let cancel = CancellationToken::new();
        let ranker = Ranker::new(&table, &RankConfig::default())
            .unwrap()
            .with_cancellation(cancel.clone());
        cancel.cancel();

        let corpus = names();
        assert!(matches!(
            ranker.rank(&corpus, &[]),
            Err(SimphonError::Cancelled)
        ));
    }

    #[test]
    fn cancel_between_batches_discards_partial_results() {
        let table = MapFeatureTable::default_table();
        let cancel = CancellationToken::new();
        let ranker = Ranker::new(&table, &RankConfig::default())
            .unwrap()
            .with_cancellation(cancel.clone());
        // 100 tokens give 4950 pairs: two batches.
        let corpus: Vec<Token> = (0..100)
            .map(|i| Token::new("eng", format!("t{i}"), ["k", "æ", "t"]))
            .collect();

        let mut events = Vec::new();
        let result = ranker.rank_with_progress(&corpus, &[], |p| {
            events.push(p);
            cancel.cancel();
        });

        assert!(matches!(result, Err(SimphonError::Cancelled)));
        assert_eq!(
            events,
            vec![Progress {
                done: BATCH_SIZE,
                total: 4950
            }]
        );
    }

    #[test]
    fn nothing_to_rank() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let one = vec![token("a")];
        assert!(matches!(
            ranker.rank(&one, &[]),
            Err(SimphonError::NothingToRank { corpus: 1, queries: 0 })
        ));
        assert!(matches!(
            ranker.rank(&[], &one),
            Err(SimphonError::NothingToRank { corpus: 0, queries: 1 })
        ));
        assert!(ranker.rank(&one, &one).is_ok(), "one query vs one corpus token");
    }

    #[test]
    fn warnings_are_surfaced() {
        let table = MapFeatureTable::default_table();
        let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
        let corpus = vec![
            Token::new("deu", "Zack", ["t͡s", "a", "k"]),
            Token::new("eng", "Zak", ["z", "æ", "k"]),
        ];
        let ranking = ranker.rank(&corpus, &[]).unwrap();
        assert_eq!(ranking.results.len(), 1);
        assert_eq!(ranking.warnings.len(), 1);
        assert_eq!(ranking.warnings[0].phoneme, "t͡s");
    }

    #[test]
    fn ngram_mode_ranks() {
        let table = MapFeatureTable::default_table();
        let cfg = RankConfig {
            mode: ModeName::Ngram,
            ngram: 2,
            bits: 64,
            ..Default::default()
        };
        let ranker = Ranker::new(&table, &cfg).unwrap();
        let corpus = names();
        let ranking = ranker.rank(&corpus, &[]).unwrap();
        assert_eq!(ranking.bits, BitSize::B64);
        assert_eq!(ranking.results[0].hamming_distance, 0);
    }

    #[test]
    fn rotation_strategy_subset_of_exhaustive() {
        let table = MapFeatureTable::default_table();
        let cfg = RankConfig {
            strategy: StrategyName::Rotations,
            span: 2,
            bits: 32,
            ..Default::default()
        };
        let ranker = Ranker::new(&table, &cfg).unwrap();
        let corpus = names();
        let ranking = ranker.rank(&corpus, &[]).unwrap();

        assert!(!ranking.results.is_empty());
        assert!(ranking.results.len() <= 28);
        // Identical fingerprints are always adjacent in every rotation.
        assert_eq!(ranking.results[0].hamming_distance, 0);
    }

    #[test]
    fn rotation_strategy_pairs_queries_with_each_other() {
        let table = MapFeatureTable::default_table();
        let cfg = RankConfig {
            strategy: StrategyName::Rotations,
            span: 10,
            bits: 32,
            ..Default::default()
        };
        let ranker = Ranker::new(&table, &cfg).unwrap();
        let corpus = vec![
            Token::new("eng", "Kat", ["k", "æ", "t"]),
            Token::new("eng", "Matt", ["m", "æ", "t"]),
        ];
        let queries = vec![
            Token::new("eng", "Zach", ["z", "æ", "k"]),
            Token::new("eng", "Zak", ["z", "æ", "k"]),
        ];
        let ranking = ranker.rank(&corpus, &queries).unwrap();

        // Four query x corpus pairs plus the query pair; no corpus pair.
        assert_eq!(ranking.results.len(), 5);
        let first = &ranking.results[0];
        assert_eq!(first.token_a.graphemes(), "Zach");
        assert_eq!(first.token_b.graphemes(), "Zak");
        assert_eq!(first.hamming_distance, 0);
        assert!(!ranking
            .results
            .iter()
            .any(|r| r.token_a.graphemes() == "Kat" && r.token_b.graphemes() == "Matt"));
    }

    fn result<'a>(a: &'a Token, b: &'a Token, d: u32) -> PairResult<'a> {
        PairResult::new(a, b, d, BitSize::B32)
    }

    #[test]
    fn window_one_is_noop() {
        let (x, y, z) = (token("x"), token("y"), token("z"));
        let mut results = vec![result(&z, &y, 1), result(&x, &y, 1), result(&y, &x, 2)];
        let before = results.clone();
        refine_windows(&mut results, 1);
        assert_eq!(results, before);
    }

    #[test]
    fn window_reorders_ties_by_token() {
        let (x, y, z) = (token("x"), token("y"), token("z"));
        let mut results = vec![result(&z, &y, 1), result(&x, &z, 1), result(&x, &y, 1)];
        refine_windows(&mut results, 3);
        let order: Vec<_> = results
            .iter()
            .map(|r| (r.token_a.graphemes(), r.token_b.graphemes()))
            .collect();
        assert_eq!(order, vec![("x", "y"), ("x", "z"), ("z", "y")]);
    }

    #[test]
    fn window_never_crosses_boundary() {
        let (x, y, z) = (token("x"), token("y"), token("z"));
        let mut results = vec![
            result(&z, &y, 1),
            result(&y, &z, 1),
            result(&x, &y, 1),
            result(&x, &z, 1),
        ];
        refine_windows(&mut results, 2);
        let order: Vec<_> = results.iter().map(|r| r.token_a.graphemes()).collect();
        // x stays in the second window even though it sorts first.
        assert_eq!(order, vec!["y", "z", "x", "x"]);
    }

    #[test]
    fn global_sort_is_stable() {
        let (x, y, z) = (token("x"), token("y"), token("z"));
        let mut results = vec![result(&z, &y, 3), result(&y, &z, 1), result(&x, &y, 3)];
        sort_by_distance(&mut results);
        let order: Vec<_> = results.iter().map(|r| r.token_a.graphemes()).collect();
        assert_eq!(order, vec!["y", "z", "x"]);
    }
}
