//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error (status {status}): {body}")]
    AiStatus { status: u16, body: String },

    #[error("Gemini returned no candidates")]
    NoCandidates,

    #[error("Unexpected Gemini response shape: {0}")]
    MalformedResponse(String),

    #[error("Image data is not a data URL (missing ',' separator)")]
    MalformedImageData,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Transport-level failures are worth another attempt; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_) | Error::AiStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
