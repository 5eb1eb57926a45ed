use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SimphonError;

/// Supported fingerprint widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum BitSize {
    B32,
    B64,
    #[default]
    B128,
    B256,
}

impl BitSize {
    /// All supported sizes, smallest first.
    pub const ALL: [BitSize; 4] = [BitSize::B32, BitSize::B64, BitSize::B128, BitSize::B256];

    /// Width in bits.
    pub fn bits(self) -> usize {
        match self {
            Self::B32 => 32,
            Self::B64 => 64,
            Self::B128 => 128,
            Self::B256 => 256,
        }
    }

    fn words(self) -> usize {
        self.bits().div_ceil(64)
    }
}

impl TryFrom<i64> for BitSize {
    type Error = SimphonError;

    fn try_from(bits: i64) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(Self::B32),
            64 => Ok(Self::B64),
            128 => Ok(Self::B128),
            256 => Ok(Self::B256),
            other => Err(SimphonError::UnsupportedBitSize(other)),
        }
    }
}

impl From<BitSize> for i64 {
    fn from(size: BitSize) -> Self {
        size.bits() as i64
    }
}

impl fmt::Display for BitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

const MAX_WORDS: usize = 4;

/// Fixed-width bit vector produced by [`SimHasher`](crate::SimHasher).
///
/// Bit `i` carries weight `2^i` when fingerprints are ordered or rendered
/// as hex. Fingerprints are only comparable when they share a width and
/// were produced with the same seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    size: BitSize,
    words: [u64; MAX_WORDS],
}

impl Fingerprint {
    /// All-zero fingerprint of the given width.
    pub fn zero(size: BitSize) -> Self {
        Self {
            size,
            words: [0; MAX_WORDS],
        }
    }

    pub fn size(&self) -> BitSize {
        self.size
    }

    /// Width in bits.
    pub fn bits(&self) -> usize {
        self.size.bits()
    }

    /// Returns bit `i`.
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.bits(), "simphon: bit {i} out of range");
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Sets bit `i` to 1.
    pub fn set(&mut self, i: usize) {
        assert!(i < self.bits(), "simphon: bit {i} out of range");
        self.words[i / 64] |= 1 << (i % 64);
    }

    /// Number of bits set to 1.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Hamming distance to `other`.
    ///
    /// Fails if the widths differ.
    pub fn hamming(&self, other: &Self) -> Result<u32, SimphonError> {
        if self.size != other.size {
            return Err(SimphonError::BitSizeMismatch {
                left: self.bits(),
                right: other.bits(),
            });
        }
        Ok(self.distance(other))
    }

    /// Hamming distance for fingerprints already known to share a width.
    pub(crate) fn distance(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.size, other.size);
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Rotates right by `k` bits within the fingerprint width: bit `i`
    /// moves to position `(i - k) mod bits`.
    pub fn rotate_right(&self, k: usize) -> Self {
        let bits = self.bits();
        let k = k % bits;
        if k == 0 {
            return *self;
        }
        let mut out = Self::zero(self.size);
        if bits < 64 {
            let mask = (1u64 << bits) - 1;
            let w = self.words[0];
            out.words[0] = ((w >> k) | (w << (bits - k))) & mask;
            return out;
        }
        let n = self.size.words();
        let (word_shift, bit_shift) = (k / 64, k % 64);
        for i in 0..n {
            let lo = self.words[(i + word_shift) % n];
            out.words[i] = if bit_shift == 0 {
                lo
            } else {
                let hi = self.words[(i + word_shift + 1) % n];
                (lo >> bit_shift) | (hi << (64 - bit_shift))
            };
        }
        out
    }

    /// Uppercase hex, most significant nibble first.
    pub fn to_hex(&self) -> String {
        let nibbles = self.bits() / 4;
        let mut s = String::with_capacity(nibbles);
        for n in (0..nibbles).rev() {
            let word = self.words[n / 16];
            let v = (word >> ((n % 16) * 4)) & 0xF;
            s.push(char::from_digit(v as u32, 16).unwrap_or('0').to_ascii_uppercase());
        }
        s
    }
}

impl Ord for Fingerprint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size.cmp(&other.size).then_with(|| {
            let n = self.size.words();
            self.words[..n].iter().rev().cmp(other.words[..n].iter().rev())
        })
    }
}

impl PartialOrd for Fingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}:{})", self.bits(), self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
