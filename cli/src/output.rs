//! Output utilities for simphon tools.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use simphon_lsh::{DataQualityWarning, PairResult};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated values with a header row (default).
    #[default]
    Tsv,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format '{other}' (expected tsv, json or yaml)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

/// A record that can be written as one TSV row.
pub trait Tabular {
    /// Column names.
    fn header() -> Vec<&'static str>;

    /// Cell values, in header order.
    fn row(&self) -> Vec<String>;
}

impl Tabular for PairResult<'_> {
    fn header() -> Vec<&'static str> {
        vec!["token_a", "token_b", "hamming_distance", "similarity_score"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.token_a.to_string(),
            self.token_b.to_string(),
            self.hamming_distance.to_string(),
            format!("{:.6}", self.similarity_score),
        ]
    }
}

impl Tabular for DataQualityWarning {
    fn header() -> Vec<&'static str> {
        vec!["token", "phoneme", "position"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.token.clone(),
            self.phoneme.clone(),
            self.position.to_string(),
        ]
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(format: OutputFormat, file: Option<PathBuf>) -> Self {
        Self { format, file }
    }

    /// Writes a list of records. TSV gets a header row followed by one row
    /// per record.
    pub fn write_records<T: Serialize + Tabular>(&self, records: &[T]) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Tsv => render_tsv(records),
            OutputFormat::Json => serde_json::to_string_pretty(records)? + "\n",
            OutputFormat::Yaml => serde_yaml::to_string(records)?,
        };
        self.emit(&output)
    }

    /// Writes a table whose columns are only known at runtime. TSV uses
    /// `header` and `rows`; JSON and YAML serialize `value`.
    pub fn write_grid<T: Serialize>(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        value: &T,
    ) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Tsv => render_rows(header, rows),
            OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        self.emit(&output)
    }

    /// Writes a single value. TSV has no layout for arbitrary values, so it
    /// falls back to YAML.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
            OutputFormat::Tsv | OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        self.emit(&output)
    }

    fn emit(&self, output: &str) -> anyhow::Result<()> {
        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Renders records as TSV.
pub fn render_tsv<T: Tabular>(records: &[T]) -> String {
    let rows: Vec<Vec<String>> = records.iter().map(Tabular::row).collect();
    render_rows(&T::header(), &rows)
}

/// Renders a header and rows as TSV. Tabs and newlines inside cells are
/// replaced by spaces so every record stays on one line.
pub fn render_rows<H: AsRef<str>>(header: &[H], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_line(&mut out, header.iter().map(AsRef::as_ref));
    for row in rows {
        push_line(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push('\t');
        }
        out.push_str(&cell.replace(['\t', '\n', '\r'], " "));
    }
    out.push('\n');
}
