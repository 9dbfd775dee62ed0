//! # Error Types
//!
//! Structured error types for calc_core. Every failure a caller can see falls
//! into one of four classes:
//!
//! - **Not found**: a referenced id is absent at some level of the hierarchy
//! - **Validation**: a spec or patch violates the catalog invariants
//! - **Invalid input**: the calculator was given unusable numbers
//! - **I/O**: the document store failed (file errors, locks, corrupt data)
//!
//! None of these are retried inside the crate.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_rate(rate_per_kg: f64) -> CalcResult<()> {
//!     if rate_per_kg < 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "rate_per_kg".to_string(),
//!             value: rate_per_kg.to_string(),
//!             reason: "Rate must not be negative".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for catalog and calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A document id does not exist in the given collection
    #[error("Not found: '{id}' in {collection}")]
    NotFound { collection: String, id: String },

    /// A material spec or patch breaks the catalog invariants
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A calculator input is missing, negative, or not a number
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Store I/O error
    #[error("I/O error: {operation} on '{path}' - {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },

    /// Store file is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Store schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create a NotFound error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an Io error
    pub fn io(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Io {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// True for NotFound errors. Callers wanting idempotent deletes match on this.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CalcError::NotFound { .. })
    }

    /// True for every error raised by the storage layer
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            CalcError::Io { .. }
                | CalcError::FileLocked { .. }
                | CalcError::SerializationError { .. }
                | CalcError::VersionMismatch { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::Io { .. } => "IO_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("quantity", "0", "Quantity must be at least 1");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::not_found("materials", "abc").error_code(), "NOT_FOUND");
        assert_eq!(CalcError::validation("density", "missing").error_code(), "VALIDATION_ERROR");
        assert_eq!(CalcError::io("read", "/tmp/x", "denied").error_code(), "IO_ERROR");
    }

    #[test]
    fn test_error_classes() {
        assert!(CalcError::not_found("materials", "abc").is_not_found());
        assert!(!CalcError::not_found("materials", "abc").is_io());
        assert!(CalcError::file_locked("a.json", "someone", "now").is_io());
        assert!(CalcError::SerializationError { reason: "bad".into() }.is_io());
        assert!(!CalcError::validation("name", "empty").is_io());
    }

    #[test]
    fn test_not_found_message() {
        let err = CalcError::not_found("materials/m1/variants", "v9");
        assert_eq!(err.to_string(), "Not found: 'v9' in materials/m1/variants");
    }
}
