use serde::{Deserialize, Serialize};

use crate::encoder::EncodingMode;
use crate::fingerprint::BitSize;
use crate::pairs::CandidateStrategy;
use crate::SimphonError;

/// Encoding mode selector as it appears in config files and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    #[default]
    Whole,
    Ngram,
}

/// Candidate strategy selector as it appears in config files and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    #[default]
    Exhaustive,
    Rotations,
}

/// Raw ranking configuration.
///
/// Integer fields are kept signed so that out-of-range values coming from a
/// config file or the command line are reported as configuration errors by
/// [`RankConfig::validate`] instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Fingerprint width: 32, 64, 128 or 256. Default: 128.
    pub bits: i64,

    /// Encoding mode. Default: whole.
    pub mode: ModeName,

    /// N-gram size, used when `mode` is `ngram`. Default: 3.
    pub ngram: i64,

    /// Refinement window size. 1 disables refinement. Default: 1.
    pub window: i64,

    /// Hyperplane seed. Default: 0.
    pub seed: i64,

    /// Candidate strategy. Default: exhaustive.
    pub strategy: StrategyName,

    /// Neighbour span for the rotations strategy. Default: 2.
    pub span: i64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            bits: 128,
            mode: ModeName::Whole,
            ngram: 3,
            window: 1,
            seed: 0,
            strategy: StrategyName::Exhaustive,
            span: 2,
        }
    }
}

/// Validated ranking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSettings {
    pub bits: BitSize,
    pub mode: EncodingMode,
    pub window: usize,
    pub seed: u64,
    pub strategy: CandidateStrategy,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            bits: BitSize::default(),
            mode: EncodingMode::default(),
            window: 1,
            seed: 0,
            strategy: CandidateStrategy::default(),
        }
    }
}

impl RankConfig {
    /// Checks every field and converts the config into typed settings.
    ///
    /// The n-gram size and span are only checked when their mode or
    /// strategy is selected.
    pub fn validate(&self) -> Result<RankSettings, SimphonError> {
        let bits = BitSize::try_from(self.bits)?;
        let mode = match self.mode {
            ModeName::Whole => EncodingMode::WholeSequence,
            ModeName::Ngram => EncodingMode::ngram(self.ngram)?,
        };
        if self.window < 1 {
            return Err(SimphonError::InvalidWindow(self.window));
        }
        if self.seed < 0 {
            return Err(SimphonError::InvalidSeed(self.seed));
        }
        let strategy = match self.strategy {
            StrategyName::Exhaustive => CandidateStrategy::Exhaustive,
            StrategyName::Rotations => {
                if self.span < 2 {
                    return Err(SimphonError::InvalidSpan(self.span));
                }
                CandidateStrategy::Rotations {
                    span: self.span as usize,
                }
            }
        };
        Ok(RankSettings {
            bits,
            mode,
            window: self.window as usize,
            seed: self.seed as u64,
            strategy,
        })
    }
}
