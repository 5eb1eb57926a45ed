use std::collections::HashMap;

use serde::Deserialize;

use crate::SimphonError;

/// Looks up articulatory feature vectors for phoneme symbols.
///
/// Every vector returned by a table has the same length,
/// [`FeatureTable::dimension`], and holds ternary weights in `{-1, 0, +1}`.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use: the encoder shares one
/// table by reference across all fingerprinting workers.
pub trait FeatureTable: Send + Sync {
    /// Number of features per vector.
    fn dimension(&self) -> usize;

    /// Feature names in column order. May be empty for anonymous tables.
    fn feature_names(&self) -> &[String];

    /// Returns the feature vector for `phoneme`, or `None` if the table
    /// does not know the symbol.
    fn lookup(&self, phoneme: &str) -> Option<&[i8]>;
}

/// In-memory feature table backed by a hash map.
#[derive(Debug, Clone)]
pub struct MapFeatureTable {
    features: Vec<String>,
    phonemes: HashMap<String, Vec<i8>>,
}

/// On-disk table format shared by the YAML and JSON loaders.
///
/// Each phoneme value is a string with one of `+`, `-`, `0` per feature.
#[derive(Deserialize)]
struct TableFile {
    features: Vec<String>,
    phonemes: HashMap<String, String>,
}

impl MapFeatureTable {
    /// Creates an empty table with the given feature names.
    pub fn new(features: Vec<String>) -> Result<Self, SimphonError> {
        if features.is_empty() {
            return Err(SimphonError::FeatureTable("no features declared".into()));
        }
        Ok(Self {
            features,
            phonemes: HashMap::new(),
        })
    }

    /// Parses a table from YAML.
    pub fn from_yaml(data: &str) -> Result<Self, SimphonError> {
        let file: TableFile = serde_yaml::from_str(data)
            .map_err(|e| SimphonError::FeatureTable(format!("parse YAML: {e}")))?;
        Self::from_file(file)
    }

    /// Parses a table from JSON.
    pub fn from_json(data: &[u8]) -> Result<Self, SimphonError> {
        let file: TableFile = serde_json::from_slice(data)
            .map_err(|e| SimphonError::FeatureTable(format!("parse JSON: {e}")))?;
        Self::from_file(file)
    }

    /// Returns the embedded default English table.
    pub fn default_table() -> Self {
        static TABLE_YAML: &str = include_str!("features.yaml");
        Self::from_yaml(TABLE_YAML).expect("embedded features.yaml is valid")
    }

    fn from_file(file: TableFile) -> Result<Self, SimphonError> {
        let mut table = Self::new(file.features)?;
        for (symbol, encoded) in file.phonemes {
            let values = parse_ternary(&encoded)
                .map_err(|e| SimphonError::FeatureTable(format!("phoneme {symbol:?}: {e}")))?;
            table.insert(symbol, values)?;
        }
        Ok(table)
    }

    /// Adds or replaces the vector for `symbol`.
    pub fn insert(&mut self, symbol: impl Into<String>, values: Vec<i8>) -> Result<(), SimphonError> {
        let symbol = symbol.into();
        if values.len() != self.features.len() {
            return Err(SimphonError::FeatureTable(format!(
                "phoneme {symbol:?} has {} values, expected {}",
                values.len(),
                self.features.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| !(-1..=1).contains(*v)) {
            return Err(SimphonError::FeatureTable(format!(
                "phoneme {symbol:?} has non-ternary value {v}"
            )));
        }
        self.phonemes.insert(symbol, values);
        Ok(())
    }

    /// Number of phonemes in the table.
    pub fn len(&self) -> usize {
        self.phonemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }
}

impl FeatureTable for MapFeatureTable {
    fn dimension(&self) -> usize {
        self.features.len()
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn lookup(&self, phoneme: &str) -> Option<&[i8]> {
        self.phonemes.get(phoneme).map(Vec::as_slice)
    }
}

fn parse_ternary(s: &str) -> Result<Vec<i8>, String> {
    s.chars()
        .map(|c| match c {
            '+' => Ok(1),
            '-' => Ok(-1),
            '0' => Ok(0),
            other => Err(format!("invalid feature value {other:?}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_loads() {
        let t = MapFeatureTable::default_table();
        assert_eq!(t.dimension(), 18);
        assert_eq!(t.feature_names()[0], "syllabic");
        assert!(t.len() > 30);

        let z = t.lookup("z").unwrap();
        assert_eq!(z.len(), 18);
        assert_eq!(z[0], -1, "z is not syllabic");
        assert_eq!(z[1], 1, "z is consonantal");
    }

    #[test]
    fn default_table_covers_multichar_symbols() {
        let t = MapFeatureTable::default_table();
        for sym in ["t̠ʃ", "d̠ʒ", "aɪ", "eɪ", "oʊ"] {
            assert!(t.lookup(sym).is_some(), "missing {sym}");
        }
    }

    #[test]
    fn lookup_miss() {
        let t = MapFeatureTable::default_table();
        assert!(t.lookup("ʘ").is_none());
    }

    #[test]
    fn from_json() {
        let json = br#"{"features": ["a", "b"], "phonemes": {"x": "+-", "y": "0+"}}"#;
        let t = MapFeatureTable::from_json(json).unwrap();
        assert_eq!(t.lookup("x"), Some(&[1i8, -1][..]));
        assert_eq!(t.lookup("y"), Some(&[0i8, 1][..]));
    }

    #[test]
    fn rejects_wrong_width() {
        let yaml = "features: [a, b]\nphonemes:\n  x: \"+\"\n";
        let err = MapFeatureTable::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SimphonError::FeatureTable(_)));
    }

    #[test]
    fn rejects_bad_symbol() {
        let yaml = "features: [a]\nphonemes:\n  x: \"?\"\n";
        assert!(MapFeatureTable::from_yaml(yaml).is_err());
    }

    #[test]
    fn insert_rejects_non_ternary() {
        let mut t = MapFeatureTable::new(vec!["a".into()]).unwrap();
        assert!(t.insert("x", vec![2]).is_err());
        assert!(t.insert("x", vec![-1]).is_ok());
    }

    #[test]
    fn rejects_empty_features() {
        assert!(MapFeatureTable::new(Vec::new()).is_err());
    }
}
