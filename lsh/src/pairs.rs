//! Candidate pair generation.
//!
//! Pairs are emitted as index pairs into a token arena laid out as
//! `corpus ++ queries`: corpus tokens occupy `0..corpus`, query tokens
//! follow them.

use std::collections::HashSet;
use std::iter::FusedIterator;

use crate::fingerprint::Fingerprint;

/// How candidate pairs are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateStrategy {
    /// Every pair: all corpus pairs, or the full queries x corpus product.
    #[default]
    Exhaustive,
    /// Only neighbours within `span` positions after sorting by each
    /// rotation of the fingerprint.
    Rotations { span: usize },
}

/// Lazy, finite sequence of index pairs with a known length.
///
/// Without queries it yields every unordered corpus pair `(i, j)` with
/// `i < j` in row-major order. With queries it yields `(query, corpus)` for
/// every query, query-major. The sequence cannot be restarted.
#[derive(Debug, Clone)]
pub struct PairPlan {
    corpus: usize,
    queries: usize,
    a: usize,
    b: usize,
    emitted: usize,
    total: usize,
}

impl PairPlan {
    /// All unordered pairs of `corpus` tokens.
    pub fn all_pairs(corpus: usize) -> Self {
        Self {
            corpus,
            queries: 0,
            a: 0,
            b: 1,
            emitted: 0,
            total: corpus * corpus.saturating_sub(1) / 2,
        }
    }

    /// Cross product of `queries` query tokens and `corpus` corpus tokens.
    pub fn cross(queries: usize, corpus: usize) -> Self {
        Self {
            corpus,
            queries,
            a: 0,
            b: 0,
            emitted: 0,
            total: queries * corpus,
        }
    }

    /// Total number of pairs the plan yields.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for PairPlan {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted == self.total {
            return None;
        }
        let pair = if self.queries == 0 {
            let pair = (self.a, self.b);
            self.b += 1;
            if self.b == self.corpus {
                self.a += 1;
                self.b = self.a + 1;
            }
            pair
        } else {
            let pair = (self.corpus + self.a, self.b);
            self.b += 1;
            if self.b == self.corpus {
                self.a += 1;
                self.b = 0;
            }
            pair
        };
        self.emitted += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.emitted;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PairPlan {}

impl FusedIterator for PairPlan {}

/// Collects rotation candidates.
///
/// For every rotation `r` in `0..bits` the tokens are sorted by their
/// fingerprint rotated right by `r` (ties by arena index) and each token is
/// paired with the next `span - 1` tokens in that order. Each unordered pair
/// is kept once, the first time it is seen. When `queries > 0` only pairs
/// involving at least one query are kept: `(query, corpus)` pairs are
/// oriented query first, query pairs as `(lower, higher)` index.
pub fn rotation_candidates(
    fingerprints: &[Fingerprint],
    corpus: usize,
    span: usize,
) -> Vec<(usize, usize)> {
    let n = fingerprints.len();
    let queries = n - corpus;
    let Some(bits) = fingerprints.first().map(Fingerprint::bits) else {
        return Vec::new();
    };
    let reach = span.max(2).min(n);

    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut out = Vec::new();
    let mut order: Vec<usize> = (0..n).collect();
    let mut rotated: Vec<Fingerprint> = Vec::with_capacity(n);

    for r in 0..bits {
        rotated.clear();
        rotated.extend(fingerprints.iter().map(|f| f.rotate_right(r)));
        order.sort_by(|&x, &y| rotated[x].cmp(&rotated[y]).then(x.cmp(&y)));

        for (pos, &x) in order.iter().enumerate() {
            for &y in order.iter().skip(pos + 1).take(reach - 1) {
                let pair = match (x >= corpus, y >= corpus) {
                    (true, false) => (x, y),
                    (false, true) => (y, x),
                    (false, false) if queries > 0 => continue,
                    _ => (x.min(y), x.max(y)),
                };
                if seen.insert(pair) {
                    out.push(pair);
                }
            }
        }
    }
    out
}

/// Pair source used by the ranker: either a lazy plan or a precomputed
/// candidate list.
#[derive(Debug)]
pub(crate) enum PairSource {
    Plan(PairPlan),
    Listed(std::vec::IntoIter<(usize, usize)>),
}

impl Iterator for PairSource {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Plan(p) => p.next(),
            Self::Listed(l) => l.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Plan(p) => p.size_hint(),
            Self::Listed(l) => l.size_hint(),
        }
    }
}

impl ExactSizeIterator for PairSource {}
