//! Error types for the value index library.
//!
//! Errors only surface while building things (retailer tables, extraction
//! rules, configuration, the HTTP client). Probing itself never fails; see
//! [`crate::types::ProbeOutcome`].

/// All errors that can occur in the value index library.
#[derive(thiserror::Error, Debug)]
pub enum ValueIndexError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

/// Convenience result type.
pub type ValueIndexResult<T> = Result<T, ValueIndexError>;
