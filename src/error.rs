//! Error types for Proctor

use thiserror::Error;

/// Errors surfaced by the proctoring service
#[derive(Debug, Error)]
pub enum ProctorError {
    #[error("{0} missing")]
    MissingField(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProctorError {
    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProctorError::MissingField(_)
                | ProctorError::InvalidImage(_)
                | ProctorError::EmptyFrame
                | ProctorError::InvalidFilename(_)
                | ProctorError::Malformed(_)
        )
    }
}

pub type ProctorResult<T> = Result<T, ProctorError>;
