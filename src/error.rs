// ⚠️ Error types for the lease ledger
//
// Validation  → a draft or patch breaks a field rule (blocks the mutation)
// NotFound    → an operation references an id the store does not hold
// Serialization / Database / Csv / Io → the persistence or interchange layer failed

use thiserror::Error;

// ============================================================================
// FIELD VALIDATION ERROR
// ============================================================================

/// One broken field rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// LEASE ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum LeaseError {
    /// One or more fields failed validation
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// No lease with this id
    #[error("Lease not found: {0}")]
    NotFound(String),

    /// Stored collection could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeaseError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        LeaseError::Validation(vec![ValidationError::new(field, message)])
    }

    /// Field errors carried by a Validation failure (empty otherwise)
    pub fn field_errors(&self) -> &[ValidationError] {
        match self {
            LeaseError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for store and backend operations
pub type LeaseResult<T> = Result<T, LeaseError>;
