//! Storage error types
//!
//! Defines all errors that can occur in the store backends.

use thiserror::Error;

/// Errors that can occur in a store backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local database error
    #[error("Database error: {0}")]
    Database(String),

    /// Remote backend could not be reached or answered with a server error
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Remote backend rejected the request
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violated
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        StorageError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether this error means the backend itself is broken, as opposed
    /// to the request being wrong
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            StorageError::Io(_) | StorageError::Database(_) | StorageError::Unavailable(_)
        )
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::Serialization(err.to_string())
        } else {
            StorageError::Unavailable(err.to_string())
        }
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("product", 7);
        assert_eq!(err.to_string(), "product 7 not found");

        let err = StorageError::duplicate("product code", "SP001");
        assert_eq!(err.to_string(), "Duplicate product code: SP001");
    }

    #[test]
    fn test_backend_failure_classification() {
        assert!(StorageError::Unavailable("timeout".into()).is_backend_failure());
        assert!(StorageError::Database("locked".into()).is_backend_failure());
        assert!(!StorageError::not_found("product", 1).is_backend_failure());
        assert!(!StorageError::Rejected("bad filter".into()).is_backend_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }
}
