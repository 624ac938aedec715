// src/error.rs
use thiserror::Error;

/// Failures inside the analysis pipeline. None of them are retried; the
/// analyzer turns each one into a failed outcome carrying the message.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Upstream {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("no data found: {0}")]
    NoData(String),

    #[error("could not parse {0}")]
    Parse(String),
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
