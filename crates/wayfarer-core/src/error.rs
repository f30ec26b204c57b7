//! Error types for the Wayfarer client

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Main error type for Wayfarer client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Backend answered with a non-success status
    #[error("API error ({status}): {}", api_detail(.status, .message))]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided message, `None` when the body carried none
        message: Option<String>,
    },

    /// Request was rejected as unauthenticated and could not be recovered
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request never produced a response (DNS, TLS, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Error during storage operations (redb)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Response body did not match the expected envelope shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Image could not be decoded, composited, or encoded
    #[error("Compose error: {0}")]
    Compose(String),

    /// User input failed form validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Map/places provider failure
    #[error("Places error: {0}")]
    Places(String),

    /// Real-time frame could not be interpreted
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Whether the user is being sent back to the login view
    pub fn is_auth_failure(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<image::ImageError> for ClientError {
    fn from(e: image::ImageError) -> Self {
        ClientError::Compose(e.to_string())
    }
}

fn api_detail(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => reqwest::StatusCode::from_u16(*status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Request failed")
            .to_string(),
    }
}

/// Result type alias using ClientError
pub type ClientResult<T> = Result<T, ClientError>;
