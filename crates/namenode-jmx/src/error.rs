//! Extraction error types.

use thiserror::Error;

/// Failures that abort a whole scrape cycle. The registry is left untouched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream could not be reached, answered non-2xx, or the body read failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The body is not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Valid JSON without a top-level `beans` list.
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Why a single mapping row was skipped on a single bean.
///
/// Never aborts the cycle; sibling fields and other beans still apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldSkip {
    #[error("field is missing")]
    Missing,

    #[error("expected {expected}, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("number is not finite")]
    NonFinite,
}
