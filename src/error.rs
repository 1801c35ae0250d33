use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("POST {path}: expected status {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        path: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Response from {path} has no `{field}` field")]
    MissingField { field: String, path: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Chain failed at {stage}: {reason}")]
    ChainFailed { stage: String, reason: String },
}

impl ChainError {
    /// Stable machine-readable code for JSON error output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "HTTP_ERROR",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::Auth(_) => "AUTH_ERROR",
            Self::AssertionFailed(_) => "ASSERTION_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::MissingConfig(_) => "MISSING_CONFIG",
            Self::Json(_) => "JSON_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::ChainFailed { .. } => "CHAIN_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
