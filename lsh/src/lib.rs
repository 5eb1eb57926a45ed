//! Phonetic similarity of pronunciation tokens via simhash fingerprints.
//!
//! # Architecture
//!
//! The pipeline processes tokens in three stages:
//!
//! 1. [`Encoder::encode`]: phoneme sequence -> [`FeatureMatrix`], one row per
//!    phoneme (or per n-gram window), looked up in a [`FeatureTable`]
//! 2. [`SimHasher::fingerprint`]: matrix -> fixed-width [`Fingerprint`]
//!    (32, 64, 128 or 256 bits)
//! 3. [`Ranker::rank`]: fingerprints -> [`PairResult`]s sorted by Hamming
//!    distance, then refined inside fixed windows
//!
//! # Determinism
//!
//! Hyperplanes are never stored. The sign of hyperplane `i` along feature
//! `j` is a pure xxHash64 of `(i, j)` keyed by the seed, so fingerprints are
//! identical across runs, thread counts and bit widths (bit `i` of a 32-bit
//! fingerprint equals bit `i` of the 256-bit one).
//!
//! # Example
//!
//! ```
//! use simphon_lsh::{MapFeatureTable, RankConfig, Ranker, Token};
//!
//! let table = MapFeatureTable::default_table();
//! let ranker = Ranker::new(&table, &RankConfig::default()).unwrap();
//!
//! let corpus = vec![
//!     Token::new("eng", "Zach", ["z", "æ", "k"]),
//!     Token::new("eng", "Zack", ["z", "æ", "k"]),
//!     Token::new("eng", "Matt", ["m", "æ", "t"]),
//! ];
//! let ranking = ranker.rank(&corpus, &[]).unwrap();
//! assert_eq!(ranking.results[0].hamming_distance, 0);
//! assert_eq!(ranking.results[0].similarity_score, 1.0);
//! ```

mod config;
mod encoder;
mod error;
mod fingerprint;
mod hasher;
pub mod pairs;
mod ranker;
mod table;
mod token;

pub use config::{ModeName, RankConfig, RankSettings, StrategyName};
pub use encoder::{DataQualityWarning, Encoded, Encoder, EncodingMode, FeatureMatrix, BOUNDARY_COLUMN};
pub use error::{ErrorKind, SimphonError};
pub use fingerprint::{BitSize, Fingerprint};
pub use hasher::{hyperplane_sign, SimHasher};
pub use pairs::{CandidateStrategy, PairPlan};
pub use ranker::{
    refine_windows, similarity, sort_by_distance, Comparisons, Fingerprinted, PairResult,
    Progress, Ranker, Ranking, BATCH_SIZE,
};
pub use table::{FeatureTable, MapFeatureTable};
pub use token::{is_boundary, Token, BOUNDARY};
