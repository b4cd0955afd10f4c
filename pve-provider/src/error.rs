//! Error types for the reconciliation layer.

use thiserror::Error;

/// Errors that can occur while reconciling a resource.
///
/// None of these are retried or recovered from here; they surface to the
/// caller unchanged and abort only the resource being reconciled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// A required input is absent and no prior state can supply it.
    #[error("Missing required field '{field}' for {resource}")]
    MissingRequiredField {
        resource: String,
        field: String,
    },

    /// A value does not have the shape the schema declares.
    #[error("Type mismatch for '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Update, replace or lookup referenced an id the host does not know.
    #[error("Resource identity not found: {0}")]
    IdentityNotFound(String),

    /// Opaque failure bubbled up from the orchestration host.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Invalid provider configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    pub(crate) fn missing(resource: &str, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            resource: resource.to_string(),
            field: field.into(),
        }
    }

    pub(crate) fn mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
