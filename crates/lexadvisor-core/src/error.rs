//! LexAdvisor error taxonomy.
//!
//! "No article cleared the threshold" is not an error; it is modelled as
//! `Option::None` by the retriever and `found = false` in the response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexError {
    /// A required credential is absent. Fatal for the whole service.
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Encoder unavailable: {0}")]
    EncodingUnavailable(String),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A write request that cannot be stored as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single stored record that cannot be decoded.
    #[error("Invalid record '{key}': {reason}")]
    InvalidRecord { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LexError {
    /// Short machine-readable label, used by the gateway in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::Config(_) => "config",
            Self::EncodingUnavailable(_) => "encoding_unavailable",
            Self::RetrievalUnavailable(_) => "retrieval_unavailable",
            Self::GenerationUnavailable(_) => "generation_unavailable",
            Self::Storage(_) => "storage",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, LexError>;
