//! CLI commands module.

mod config;
mod fingerprint;
mod matrix;
mod rank;
mod util;

pub use config::ConfigCommand;
pub use fingerprint::FingerprintCommand;
pub use matrix::MatrixCommand;
pub use rank::{CompareCommand, SearchCommand};

pub(crate) use util::*;
