//! # Error Types
//!
//! Domain-specific error types for keystone-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  keystone-core errors (this file)                                      │
//! │  ├── CoreError         - Business rule violations                      │
//! │  ├── ValidationErrors  - Field-level list for a whole payload           │
//! │  └── ValidationError   - One failed rule                               │
//! │                                                                         │
//! │  keystone-db errors (separate crate)                                   │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  keystone app errors                                                   │
//! │  └── ApiError          - What the frontend sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationErrors → CoreError → DbError → ApiError → Frontend    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field path, status, number)
//! 3. Validation collects every failure, not just the first one
//! 4. Nothing in this crate panics on bad input

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input payload failed validation. Carries every field-level failure.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A status change that the workflow does not allow.
    ///
    /// ## When This Occurs
    /// ```text
    /// Quotation (draft) ──► convert
    ///      │
    ///      ▼
    /// InvalidTransition { entity: "quotation", from: "draft", to: "converted" }
    ///      │
    ///      ▼
    /// UI shows: "Cannot move quotation from draft to converted"
    /// ```
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Status value the workflow does not know about.
    #[error("Unknown {entity} status: '{value}'")]
    UnknownStatus { entity: &'static str, value: String },

    /// Order cannot enter processing until staff assign a warehouse.
    #[error("Order {order_number} has no warehouse assigned")]
    WarehouseRequired { order_number: String },

    /// Availability check still has unavailable lines.
    #[error("{unavailable} of {total} line(s) are not available")]
    StockUnavailable { unavailable: usize, total: usize },

    /// Picking list export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(ValidationErrors::single("", err))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Field name this failure refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Field-Level Error List
// =============================================================================

/// One entry in a [`ValidationErrors`] list.
///
/// `path` locates the field inside the payload, e.g. `items[2].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every validation failure found in one payload.
///
/// ## Serialization
/// ```json
/// {
///   "errors": [
///     { "path": "items[0].quantity", "message": "quantity must be positive" },
///     { "path": "items[1].unitPrice", "message": "unitPrice must not be negative" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding exactly one failure.
    pub fn single(prefix: &str, err: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(prefix, err);
        errors
    }

    /// Records a failure under `prefix` (e.g. `items[3]`).
    pub fn push(&mut self, prefix: &str, err: ValidationError) {
        let path = if prefix.is_empty() {
            err.field().to_string()
        } else {
            format!("{}.{}", prefix, err.field())
        };
        self.errors.push(FieldError {
            path,
            message: err.to_string(),
        });
    }

    /// Records the failure of a `Result`, if any.
    pub fn check(&mut self, prefix: &str, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.push(prefix, err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidTransition {
            entity: "quotation",
            from: "draft".to_string(),
            to: "converted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot move quotation from draft to converted"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_field_paths_are_prefixed() {
        let mut errors = ValidationErrors::new();
        errors.push(
            "items[1]",
            ValidationError::MustBePositive {
                field: "quantity".to_string(),
            },
        );
        errors.check("", Ok(()));
        errors.check(
            "",
            Err(ValidationError::Required {
                field: "customer".to_string(),
            }),
        );

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors[0].path, "items[1].quantity");
        assert_eq!(errors.errors[1].path, "customer");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "sku".to_string(),
        }
        .into();
        match err {
            CoreError::Validation(list) => assert_eq!(list.errors[0].path, "sku"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
