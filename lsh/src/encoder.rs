use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::table::FeatureTable;
use crate::token::{is_boundary, Token};
use crate::SimphonError;

/// Name of the reserved trailing matrix column that marks boundary rows.
pub const BOUNDARY_COLUMN: &str = "boundary";

/// How a token's phoneme rows are turned into matrix rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingMode {
    /// Legacy mode: each row sums `n` consecutive phoneme rows (stride 1).
    NGram(usize),
    /// One row per phoneme, boundary markers included.
    #[default]
    WholeSequence,
}

impl EncodingMode {
    /// Builds an n-gram mode, rejecting sizes below 1.
    pub fn ngram(n: i64) -> Result<Self, SimphonError> {
        if n < 1 {
            return Err(SimphonError::InvalidNgram(n));
        }
        Ok(Self::NGram(n as usize))
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NGram(n) => write!(f, "{n}-gram"),
            Self::WholeSequence => write!(f, "whole"),
        }
    }
}

/// A phoneme the feature table did not know.
///
/// Missing phonemes are encoded as a neutral row; the warning lets the
/// caller surface the data-quality problem next to the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityWarning {
    /// Display form of the offending token.
    pub token: String,
    /// The unknown phoneme symbol.
    pub phoneme: String,
    /// Index of the phoneme within the token.
    pub position: usize,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no features for {:?} at position {} in {}",
            self.phoneme, self.position, self.token
        )
    }
}

/// Row-major integer matrix, one row per phoneme or n-gram window.
///
/// Columns are the table's features followed by the boundary column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureMatrix {
    cols: usize,
    data: Vec<i32>,
}

impl FeatureMatrix {
    fn with_capacity(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            data: Vec::with_capacity(cols * rows),
        }
    }

    fn push_row(&mut self, row: &[i32]) {
        debug_assert_eq!(row.len(), self.cols);
        self.data.extend_from_slice(row);
    }

    /// Number of columns, boundary column included.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    /// Returns row `i`.
    pub fn row(&self, i: usize) -> &[i32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterates over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[i32]> {
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Element-wise sum of all rows.
    pub fn column_sums(&self) -> Vec<i64> {
        let mut sums = vec![0i64; self.cols];
        for row in self.iter_rows() {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v as i64;
            }
        }
        sums
    }
}

/// Output of [`Encoder::encode`].
#[derive(Debug, Clone)]
pub struct Encoded {
    pub matrix: FeatureMatrix,
    pub warnings: Vec<DataQualityWarning>,
}

/// Turns tokens into feature matrices using a [`FeatureTable`].
pub struct Encoder<'t> {
    table: &'t dyn FeatureTable,
    mode: EncodingMode,
}

impl<'t> Encoder<'t> {
    /// Creates an encoder. Fails if the mode is `NGram(0)`.
    pub fn new(table: &'t dyn FeatureTable, mode: EncodingMode) -> Result<Self, SimphonError> {
        if let EncodingMode::NGram(0) = mode {
            return Err(SimphonError::InvalidNgram(0));
        }
        Ok(Self { table, mode })
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Matrix column names: the table's features plus [`BOUNDARY_COLUMN`].
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.feature_names().to_vec();
        if names.len() != self.table.dimension() {
            names = (0..self.table.dimension()).map(|i| format!("f{i}")).collect();
        }
        names.push(BOUNDARY_COLUMN.to_string());
        names
    }

    /// Encodes `token` according to the configured mode.
    ///
    /// Unknown phonemes never abort encoding; they are reported in
    /// [`Encoded::warnings`].
    pub fn encode(&self, token: &Token) -> Result<Encoded, SimphonError> {
        let (rows, warnings) = self.phoneme_rows(token)?;
        let matrix = match self.mode {
            EncodingMode::WholeSequence => rows,
            EncodingMode::NGram(n) => ngram_rows(&rows, n),
        };
        Ok(Encoded { matrix, warnings })
    }

    /// Encodes `token` with one row per phoneme, ignoring the n-gram mode.
    pub fn phoneme_matrix(&self, token: &Token) -> Result<Encoded, SimphonError> {
        let (matrix, warnings) = self.phoneme_rows(token)?;
        Ok(Encoded { matrix, warnings })
    }

    fn phoneme_rows(
        &self,
        token: &Token,
    ) -> Result<(FeatureMatrix, Vec<DataQualityWarning>), SimphonError> {
        if token.is_empty() {
            return Err(SimphonError::EmptyPhonemes {
                token: token.to_string(),
            });
        }

        let dim = self.table.dimension();
        let mut matrix = FeatureMatrix::with_capacity(dim + 1, token.len());
        let mut warnings = Vec::new();
        let mut row = vec![0i32; dim + 1];

        for (pos, phoneme) in token.phonemes().iter().enumerate() {
            row.fill(0);
            if is_boundary(phoneme) {
                row[dim] = 1;
            } else {
                match self.table.lookup(phoneme) {
                    Some(v) if v.len() == dim => {
                        for (dst, &src) in row.iter_mut().zip(v) {
                            *dst = src as i32;
                        }
                    }
                    Some(v) => {
                        return Err(SimphonError::FeatureTable(format!(
                            "phoneme {phoneme:?} has {} values, table dimension is {dim}",
                            v.len()
                        )));
                    }
                    None => {
                        warn!(phoneme = %phoneme, token = %token, "phoneme missing from feature table");
                        warnings.push(DataQualityWarning {
                            token: token.to_string(),
                            phoneme: phoneme.clone(),
                            position: pos,
                        });
                    }
                }
            }
            matrix.push_row(&row);
        }

        Ok((matrix, warnings))
    }
}

/// Sums sliding windows of `n` rows. Sequences shorter than `n` collapse
/// into a single row.
fn ngram_rows(rows: &FeatureMatrix, n: usize) -> FeatureMatrix {
    let len = rows.rows();
    let windows = if len < n { 1 } else { len - n + 1 };
    let width = n.min(len);
    let mut out = FeatureMatrix::with_capacity(rows.cols(), windows);
    let mut acc = vec![0i32; rows.cols()];

    for start in 0..windows {
        acc.fill(0);
        for r in start..start + width {
            for (a, &v) in acc.iter_mut().zip(rows.row(r)) {
                *a += v;
            }
        }
        out.push_row(&acc);
    }
    out
}
