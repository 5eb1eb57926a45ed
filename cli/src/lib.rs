//! CLI utilities for simphon.
//!
//! This crate provides config-file handling, input loading and output
//! formatting for the `simphon` command line tool.

pub mod config;
pub mod input;
pub mod output;
pub mod paths;

pub use config::{load_config, save_config, Config};
pub use input::{load_feature_table, load_file, load_tokens, parse_tokens_yaml, InputError};
pub use output::{render_rows, render_tsv, Output, OutputFormat, Tabular};
pub use paths::Paths;
