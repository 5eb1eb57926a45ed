//! Input loading utilities.

use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use simphon_lsh::{MapFeatureTable, SimphonError, Token};
use thiserror::Error;

/// Error type for input loading.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to parse file (tried YAML and JSON)")]
    ParseFailed,
    #[error(transparent)]
    FeatureTable(#[from] SimphonError),
}

/// Loads a YAML or JSON file into the provided type.
pub fn load_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, InputError> {
    let data = fs::read(path.as_ref())?;
    parse_file(&data, path.as_ref())
}

/// Parses data based on file extension, trying YAML then JSON when the
/// extension is unknown.
pub fn parse_file<T: DeserializeOwned>(data: &[u8], path: impl AsRef<Path>) -> Result<T, InputError> {
    match extension(path.as_ref()).as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(data)?),
        Some("json") => Ok(serde_json::from_slice(data)?),
        _ => {
            if let Ok(v) = serde_yaml::from_slice(data) {
                return Ok(v);
            }
            if let Ok(v) = serde_json::from_slice(data) {
                return Ok(v);
            }
            Err(InputError::ParseFailed)
        }
    }
}

/// Token files hold either a bare list or a `tokens:` mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenFile {
    Bare(Vec<Token>),
    Wrapped { tokens: Vec<Token> },
}

/// Loads a token list from a YAML or JSON file.
pub fn load_tokens(path: impl AsRef<Path>) -> Result<Vec<Token>, InputError> {
    let file: TokenFile = load_file(path)?;
    Ok(parse_tokens(file))
}

/// Parses a token list from YAML text.
pub fn parse_tokens_yaml(data: &str) -> Result<Vec<Token>, InputError> {
    let file: TokenFile = serde_yaml::from_str(data)?;
    Ok(parse_tokens(file))
}

fn parse_tokens(file: TokenFile) -> Vec<Token> {
    match file {
        TokenFile::Bare(tokens) | TokenFile::Wrapped { tokens } => tokens,
    }
}

/// Loads a feature table from a YAML or JSON file.
pub fn load_feature_table(path: impl AsRef<Path>) -> Result<MapFeatureTable, InputError> {
    let data = fs::read(path.as_ref())?;
    let table = match extension(path.as_ref()).as_deref() {
        Some("json") => MapFeatureTable::from_json(&data)?,
        _ => MapFeatureTable::from_yaml(&String::from_utf8(data)?)?,
    };
    Ok(table)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
