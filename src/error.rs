//! Error types for the symbol-index conversion engine
//!
//! Per-item problems (a malformed symbol, an unnamed declaration, a rejected
//! edge) are recorded in the conversion report and never abort a run. Only
//! [`ConvertError`] propagates to the caller.

use crate::storage::SinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a conversion run
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The destination sink could not be opened, committed or closed
    #[error("Sink failure during {operation}: {source}")]
    Sink {
        operation: &'static str,
        source: SinkError,
    },

    /// The symbol index could not be read
    #[error("Failed to read symbol index '{path}': {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The symbol index is not valid JSON for the expected shape
    #[error("Failed to decode symbol index: {0}")]
    InputDecode(#[from] serde_json::Error),

    /// Settings could not be loaded from file or environment
    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A parallel conversion worker panicked
    #[error("Conversion worker for job {job} panicked")]
    WorkerPanicked { job: usize },
}

impl ConvertError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Sink { .. } => "SINK_FAILURE",
            Self::InputRead { .. } => "INPUT_READ_ERROR",
            Self::InputDecode(_) => "INPUT_DECODE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::WorkerPanicked { .. } => "WORKER_PANICKED",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Sink { .. } => vec![
                "Check that the destination is writable and not held open by another process",
                "Re-run the conversion; no partial output was committed",
            ],
            Self::InputRead { .. } => vec![
                "Check that the index file exists and you have read permissions",
            ],
            Self::InputDecode(_) => vec![
                "Regenerate the index and export it as JSON with proto field names preserved",
            ],
            Self::Config(_) => vec![
                "Check .sciptrail/settings.toml and SCIPTRAIL_* environment variables",
            ],
            Self::WorkerPanicked { .. } => vec![],
        }
    }

    pub(crate) fn sink(operation: &'static str, source: SinkError) -> Self {
        Self::Sink { operation, source }
    }
}

/// Per-symbol errors produced while parsing or naming a symbol string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Malformed symbol '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("Symbol '{symbol}' has no name and kind {kind} requires one")]
    Unnamed { symbol: String, kind: String },
}

impl SymbolError {
    pub fn malformed(symbol: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for conversion runs
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type alias for symbol parsing
pub type SymbolResult<T> = Result<T, SymbolError>;
