//! Error types for benchdesk-core

use thiserror::Error;

use crate::types::Collection;

/// Main error type for the benchdesk-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Document does not exist in the store
    #[error("document not found: {collection}/{name}")]
    DocumentNotFound { collection: Collection, name: String },

    /// Document name that cannot be mapped to a single file
    #[error("invalid document name: {0:?}")]
    InvalidDocumentName(String),

    /// Result document does not have the expected shape
    #[error("malformed result document: {0}")]
    MalformedDocument(String),

    /// Structured form could not apply an edit
    #[error("form error: {0}")]
    Form(String),

    /// Run service API error
    #[error("run service error: {0}")]
    RunService(String),

    /// Run status record violates its counting invariant
    #[error("invalid run status: {0}")]
    InvalidStatus(String),
}

impl Error {
    /// Returns true for errors the UI should treat as "document went away".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DocumentNotFound { .. })
    }
}

/// Result type alias for benchdesk-core
pub type Result<T> = std::result::Result<T, Error>;
