use thiserror::Error;

/// Errors returned by simphon operations.
#[derive(Debug, Error)]
pub enum SimphonError {
    #[error("token {token} has an empty phoneme sequence")]
    EmptyPhonemes { token: String },

    #[error("nothing to rank: corpus has {corpus} token(s) and {queries} query token(s)")]
    NothingToRank { corpus: usize, queries: usize },

    #[error("unsupported bit size {0}: must be one of 32, 64, 128, 256")]
    UnsupportedBitSize(i64),

    #[error("invalid window size {0}: must be at least 1")]
    InvalidWindow(i64),

    #[error("invalid n-gram size {0}: must be at least 1")]
    InvalidNgram(i64),

    #[error("invalid seed {0}: must be non-negative")]
    InvalidSeed(i64),

    #[error("invalid candidate span {0}: must be at least 2")]
    InvalidSpan(i64),

    #[error("fingerprint width mismatch: {left} bits vs {right} bits")]
    BitSizeMismatch { left: usize, right: usize },

    #[error("feature table: {0}")]
    FeatureTable(String),

    #[error("ranking cancelled")]
    Cancelled,
}

/// Coarse classification of a [`SimphonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input data cannot be processed (empty tokens, nothing to rank).
    Validation,
    /// A configuration value is out of range or inconsistent.
    Config,
    /// The run was cancelled cooperatively.
    Cancelled,
}

impl SimphonError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPhonemes { .. } | Self::NothingToRank { .. } => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let err = SimphonError::EmptyPhonemes { token: "x".into() };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(SimphonError::UnsupportedBitSize(100).kind(), ErrorKind::Config);
        assert_eq!(SimphonError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn error_messages() {
        let err = SimphonError::NothingToRank { corpus: 1, queries: 0 };
        assert_eq!(
            err.to_string(),
            "nothing to rank: corpus has 1 token(s) and 0 query token(s)"
        );
    }
}
