use thiserror::Error;

use crate::domains::core::object_storage::ObjectStorageError;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Error executing statement: {0}")]
    Execution(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(String),
}

/// Domain-level errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Packaging error: {0}")]
    Packaging(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ObjectStorageError> for DomainError {
    fn from(error: ObjectStorageError) -> Self {
        DomainError::Storage(error.to_string())
    }
}

/// Service-level errors (application specific)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}
