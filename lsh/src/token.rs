use std::fmt;

use serde::{Deserialize, Serialize};

/// Phoneme symbol marking a sub-word boundary inside a token.
pub const BOUNDARY: &str = "#";

/// A pronunciation token: a written form tagged with its language and
/// its phoneme sequence.
///
/// Tokens are immutable once constructed. Ordering compares
/// `(language, graphemes, phonemes)` and is the deterministic identifier
/// order used to break ties when ranking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    language: String,
    graphemes: String,
    phonemes: Vec<String>,
}

impl Token {
    /// Creates a token from its parts.
    pub fn new<I, S>(language: impl Into<String>, graphemes: impl Into<String>, phonemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            language: language.into(),
            graphemes: graphemes.into(),
            phonemes: phonemes.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a token from sub-word phoneme groups, joining them with
    /// [`BOUNDARY`] markers.
    ///
    /// ```
    /// use simphon_lsh::Token;
    ///
    /// let t = Token::from_words("eng", "Mary Ann", [&["m", "ɛ", "ɹ", "i"][..], &["æ", "n"]]);
    /// assert_eq!(t.phonemes().join(" "), "m ɛ ɹ i # æ n");
    /// ```
    pub fn from_words<'a, W>(language: impl Into<String>, graphemes: impl Into<String>, words: W) -> Self
    where
        W: IntoIterator<Item = &'a [&'a str]>,
    {
        let mut phonemes = Vec::new();
        for (i, word) in words.into_iter().enumerate() {
            if i > 0 {
                phonemes.push(BOUNDARY.to_string());
            }
            phonemes.extend(word.iter().map(|p| p.to_string()));
        }
        Self {
            language: language.into(),
            graphemes: graphemes.into(),
            phonemes,
        }
    }

    /// ISO 639-3 style language tag (e.g. "eng").
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The written form.
    pub fn graphemes(&self) -> &str {
        &self.graphemes
    }

    /// The phoneme sequence, boundary markers included.
    pub fn phonemes(&self) -> &[String] {
        &self.phonemes
    }

    /// Number of phoneme symbols, boundary markers included.
    pub fn len(&self) -> usize {
        self.phonemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }
}

impl AsRef<Token> for Token {
    fn as_ref(&self) -> &Token {
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {} /{}/",
            self.language,
            self.graphemes,
            self.phonemes.join(" ")
        )
    }
}

/// Returns true if `symbol` is a sub-word boundary marker.
pub fn is_boundary(symbol: &str) -> bool {
    symbol == BOUNDARY
}
