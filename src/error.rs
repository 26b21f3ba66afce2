// error.rs - Error types shared across the crate

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal, run-level errors. Anything in here aborts before (or instead of)
/// producing a summary table.
#[derive(Debug, Error)]
pub enum DndsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read '{path}': {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid FASTA record in '{path}': {message}")]
    Fasta { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no usable sequences after trimming and filtering")]
    NoUsableSequences,

    #[error("rate estimation produced zero usable results")]
    NoResults,
}

impl DndsError {
    pub fn config(message: impl Into<String>) -> Self {
        DndsError::Config(message.into())
    }
}

/// Per-record trimming failure. The record is dropped, the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrimError {
    #[error("trim window {start}..={stop} is outside a sequence of length {length}")]
    OutOfRangeTrim {
        start: usize,
        stop: usize,
        length: usize,
    },
}

/// Per-pair estimation failure. Excluded from aggregation, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("coding lengths differ ({0} vs {1} nt)")]
    LengthMismatch(usize, usize),

    #[error("no comparable codons")]
    NoComparableCodons,

    #[error("substitution saturation (p = {0:.3})")]
    Saturated(f64),

    #[error("external tool failed: {0}")]
    ToolFailed(String),

    #[error("external tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed estimator output: {0}")]
    MalformedOutput(String),

    #[error("estimator panicked: {0}")]
    Panicked(String),
}

impl RateError {
    /// Failures worth a second attempt: the external process could not be
    /// started or exited abnormally. Everything else is deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, RateError::ToolFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RateError::ToolFailed("exit status 1".to_string()).is_transient());
        assert!(!RateError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(!RateError::LengthMismatch(9, 12).is_transient());
        assert!(!RateError::NoComparableCodons.is_transient());
    }

    #[test]
    fn test_trim_error_message() {
        let err = TrimError::OutOfRangeTrim { start: 1, stop: 700, length: 615 };
        assert_eq!(
            err.to_string(),
            "trim window 1..=700 is outside a sequence of length 615"
        );
    }
}
