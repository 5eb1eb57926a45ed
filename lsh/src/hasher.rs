use xxhash_rust::xxh64::xxh64;

use crate::encoder::FeatureMatrix;
use crate::fingerprint::{BitSize, Fingerprint};

/// Projects feature matrices into simhash fingerprints using seeded
/// random hyperplanes.
///
/// # Algorithm
///
/// Hyperplane `i` has one sign per matrix column `j`, given by
/// [`hyperplane_sign`]: a pure xxHash64 of `(i, j)` keyed by the seed.
/// No plane matrix is stored, so any bit can be recomputed on its own.
///
/// For every bit the hasher sums `dot(row, hyperplane_i)` over all rows and
/// sets the bit when the sum is strictly positive. Ties resolve to 0.
///
/// The projection is linear, so the rows are first collapsed into their
/// column sums and projected once. This is the same integer arithmetic as
/// projecting row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimHasher {
    size: BitSize,
    seed: u64,
}

impl SimHasher {
    /// Creates a hasher producing `size`-bit fingerprints.
    pub fn new(size: BitSize, seed: u64) -> Self {
        Self { size, seed }
    }

    pub fn size(&self) -> BitSize {
        self.size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Computes the fingerprint of `matrix`.
    pub fn fingerprint(&self, matrix: &FeatureMatrix) -> Fingerprint {
        let sums = matrix.column_sums();
        let mut fp = Fingerprint::zero(self.size);
        for bit in 0..self.size.bits() {
            let projection: i64 = sums
                .iter()
                .enumerate()
                .filter(|(_, s)| **s != 0)
                .map(|(j, s)| s * hyperplane_sign(bit, j, self.seed) as i64)
                .sum();
            if projection > 0 {
                fp.set(bit);
            }
        }
        fp
    }
}

/// Sign of hyperplane `bit` along feature column `feature`: `+1` or `-1`.
pub fn hyperplane_sign(bit: usize, feature: usize, seed: u64) -> i8 {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&(bit as u32).to_le_bytes());
    key[4..].copy_from_slice(&(feature as u32).to_le_bytes());
    if xxh64(&key, seed) & 1 == 1 {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{Encoder, EncodingMode};
    use crate::table::MapFeatureTable;
    use crate::Token;

    fn matrix(table: &MapFeatureTable, phonemes: &[&str]) -> FeatureMatrix {
        Encoder::new(table, EncodingMode::WholeSequence)
            .unwrap()
            .encode(&Token::new("eng", "t", phonemes.iter().copied()))
            .unwrap()
            .matrix
    }

    /// Row-by-row projection, the direct reading of the algorithm.
    fn fingerprint_by_rows(h: &SimHasher, m: &FeatureMatrix) -> Fingerprint {
        let mut fp = Fingerprint::zero(h.size());
        for bit in 0..h.size().bits() {
            let mut sum = 0i64;
            for row in m.iter_rows() {
                for (j, &v) in row.iter().enumerate() {
                    sum += v as i64 * hyperplane_sign(bit, j, h.seed()) as i64;
                }
            }
            if sum > 0 {
                fp.set(bit);
            }
        }
        fp
    }

    #[test]
    fn hyperplane_sign_is_pure() {
        for bit in 0..64 {
            for j in 0..20 {
                let s = hyperplane_sign(bit, j, 7);
                assert!(s == 1 || s == -1);
                assert_eq!(s, hyperplane_sign(bit, j, 7));
            }
        }
    }

    #[test]
    fn hyperplane_signs_are_balanced() {
        let plus = (0..256)
            .flat_map(|b| (0..19).map(move |j| hyperplane_sign(b, j, 0)))
            .filter(|&s| s == 1)
            .count();
        let total = 256 * 19;
        let ratio = plus as f64 / total as f64;
        assert!((ratio - 0.5).abs() < 0.05, "ratio of +1 signs was {ratio}");
    }

    #[test]
    fn bits_do_not_depend_on_width() {
        let table = MapFeatureTable::default_table();
        let m = matrix(&table, &["k", "æ", "θ", "i"]);
        let small = SimHasher::new(BitSize::B32, 3).fingerprint(&m);
        let large = SimHasher::new(BitSize::B256, 3).fingerprint(&m);
        for i in 0..32 {
            assert_eq!(small.get(i), large.get(i), "bit {i}");
        }
    }

    #[test]
    fn column_sum_projection_matches_rows() {
        let table = MapFeatureTable::default_table();
        let m = matrix(&table, &["n", "ə", "θ", "æ", "n", "j", "ə", "l"]);
        for seed in [0, 1, 42] {
            let h = SimHasher::new(BitSize::B128, seed);
            assert_eq!(h.fingerprint(&m), fingerprint_by_rows(&h, &m));
        }
    }

    #[test]
    fn fingerprint_deterministic() {
        let table = MapFeatureTable::default_table();
        let m = matrix(&table, &["m", "æ", "θ", "j", "u"]);
        let h = SimHasher::new(BitSize::B64, 9);
        assert_eq!(h.fingerprint(&m), h.fingerprint(&m));
        assert_eq!(h.fingerprint(&m), SimHasher::new(BitSize::B64, 9).fingerprint(&m));
    }

    #[test]
    fn neutral_matrix_is_all_zero() {
        let table = MapFeatureTable::default_table();
        let m = matrix(&table, &["ʘ", "ǀ"]);
        let fp = SimHasher::new(BitSize::B128, 0).fingerprint(&m);
        assert_eq!(fp.count_ones(), 0, "ties resolve to 0");
    }
}
