//! Error types for vidrag.

use thiserror::Error;

/// Library-level error type for vidrag operations.
#[derive(Error, Debug)]
pub enum VidragError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Audio acquisition failed: {0}")]
    Acquisition(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Failed to load transcript: {0}")]
    Load(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Coarse classification of a [`VidragError`], one per pipeline failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Acquisition,
    Transcription,
    Load,
    Index,
    Retrieval,
    Agent,
    Other,
}

impl VidragError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VidragError::Configuration(_) => ErrorKind::Configuration,
            VidragError::Acquisition(_) | VidragError::ToolNotFound(_) => ErrorKind::Acquisition,
            VidragError::Transcription(_) => ErrorKind::Transcription,
            VidragError::Load(_) => ErrorKind::Load,
            VidragError::Index(_) => ErrorKind::Index,
            VidragError::Retrieval(_) => ErrorKind::Retrieval,
            VidragError::Agent(_) => ErrorKind::Agent,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type alias for vidrag operations.
pub type Result<T> = std::result::Result<T, VidragError>;
