//! # Error Types
//!
//! Structured error types for rebound_core. Every failure mode the engine or
//! repository can produce is an explicit variant with enough context to be
//! handled programmatically or rendered as a human-readable rejection.
//!
//! ## Example
//!
//! ```rust
//! use rebound_core::errors::{CoreError, CoreResult};
//!
//! fn validate_reading(r: f64) -> CoreResult<()> {
//!     if r <= 0.0 {
//!         return Err(CoreError::invalid_input(
//!             "r_value",
//!             r.to_string(),
//!             "R-value must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rebound_core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Structured error type for engine and repository operations.
///
/// Validation failures abort the operation with no state mutated. A
/// `DuplicateRecord` is not fatal: the save path surfaces it as a resolvable
/// conflict the caller answers with overwrite, rename, or abort.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CoreError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Fewer valid readings than the statistical reduction requires
    #[error("At least {required} test values are required ({valid} valid)")]
    InsufficientReadings { valid: usize, required: usize },

    /// A record with the same (project, location) already exists
    #[error("A test for '{project}' / '{location}' already exists")]
    DuplicateRecord { project: String, location: String },

    /// Delete criteria matched more than one record
    #[error("Delete refused: criteria match {matches} records, expected exactly one")]
    AmbiguousDelete { matches: usize },

    /// No record matched the given criteria
    #[error("No record found for {criteria}")]
    RecordNotFound { criteria: String },

    /// Malformed share token
    #[error("Corrupt share data: {reason}")]
    ShareDecode { reason: String },

    /// Malformed import document
    #[error("Import parse error: {reason}")]
    ImportParse { reason: String },

    /// Key-value store access failure
    #[error("Store error: {operation} - {reason}")]
    StoreError { operation: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CoreError::MissingField {
            field: field.into(),
        }
    }

    /// Create a DuplicateRecord error
    pub fn duplicate_record(project: impl Into<String>, location: impl Into<String>) -> Self {
        CoreError::DuplicateRecord {
            project: project.into(),
            location: location.into(),
        }
    }

    /// Create a ShareDecode error
    pub fn share_decode(reason: impl Into<String>) -> Self {
        CoreError::ShareDecode {
            reason: reason.into(),
        }
    }

    /// Create an ImportParse error
    pub fn import_parse(reason: impl Into<String>) -> Self {
        CoreError::ImportParse {
            reason: reason.into(),
        }
    }

    /// Create a StoreError
    pub fn store_error(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::StoreError {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (the caller can resolve and retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::DuplicateRecord { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::MissingField { .. } => "MISSING_FIELD",
            CoreError::InsufficientReadings { .. } => "INSUFFICIENT_READINGS",
            CoreError::DuplicateRecord { .. } => "DUPLICATE_RECORD",
            CoreError::AmbiguousDelete { .. } => "AMBIGUOUS_DELETE",
            CoreError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            CoreError::ShareDecode { .. } => "SHARE_DECODE",
            CoreError::ImportParse { .. } => "IMPORT_PARSE",
            CoreError::StoreError { .. } => "STORE_ERROR",
            CoreError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CoreError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CoreError::invalid_input("r_value", "-5.0", "R-value must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::missing_field("project").error_code(), "MISSING_FIELD");
        assert_eq!(
            CoreError::duplicate_record("Plant A", "Column C3").error_code(),
            "DUPLICATE_RECORD"
        );
        assert_eq!(
            CoreError::InsufficientReadings { valid: 8, required: 9 }.error_code(),
            "INSUFFICIENT_READINGS"
        );
    }

    #[test]
    fn test_only_conflicts_are_recoverable() {
        assert!(CoreError::duplicate_record("P", "L").is_recoverable());
        assert!(!CoreError::share_decode("bad token").is_recoverable());
        assert!(!CoreError::AmbiguousDelete { matches: 3 }.is_recoverable());
    }
}
