//! # API Error Type
//!
//! Unified error type for Keystone commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Keystone                               │
//! │                                                                         │
//! │  Command Function  ── Result<T, ApiError>                               │
//! │         │                                                               │
//! │         ├── ValidationErrors ─► VALIDATION_ERROR (+ field list)         │
//! │         ├── InvalidTransition ─► INVALID_TRANSITION                     │
//! │         ├── StockUnavailable ──► INSUFFICIENT_STOCK                     │
//! │         ├── StatusConflict ────► CONFLICT                               │
//! │         ├── DbError::NotFound ─► NOT_FOUND                              │
//! │         └── other DbError ─────► DATABASE_ERROR (details logged only)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ApiError` serializes with a machine-readable `code` and a human-readable
//! `message`, so a frontend or the CLI can branch on the code.

use keystone_core::{CoreError, FieldError};
use keystone_db::DbError;
use serde::Serialize;

use crate::config::ConfigError;

/// Error returned from every command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Validation failed: items[0].quantity: quantity must be positive",
///   "errors": [{ "path": "items[0].quantity", "message": "quantity must be positive" }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Field-level failures, only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Business logic error (422)
    BusinessLogic,

    /// Status change not allowed by the workflow
    InvalidTransition,

    /// Quotation lines that cannot be filled from stock
    InsufficientStock,

    /// Record changed underneath the request (409)
    Conflict,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a business logic error.
    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            err @ DbError::StatusConflict { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Decode { column, message } => {
                tracing::error!(column = %column, "Stored value could not be decoded: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Stored data is corrupt")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => ApiError {
                code: ErrorCode::ValidationError,
                message: format!("Validation failed: {}", errors),
                errors: Some(errors.errors),
            },
            err @ CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, err.to_string())
            }
            err @ CoreError::UnknownStatus { .. } => ApiError::validation(err.to_string()),
            err @ CoreError::WarehouseRequired { .. } => ApiError::business(err.to_string()),
            err @ CoreError::StockUnavailable { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::Export(e) => {
                tracing::error!("Picking list export failed: {}", e);
                ApiError::internal("Picking list export failed")
            }
        }
    }
}

/// Configuration problems surface at startup.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result alias for command functions.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{ValidationError, ValidationErrors};

    #[test]
    fn test_validation_keeps_field_list() {
        let errors = ValidationErrors::single(
            "items[0]",
            ValidationError::MustBePositive {
                field: "quantity".into(),
            },
        );
        let api: ApiError = CoreError::Validation(errors).into();

        assert_eq!(api.code, ErrorCode::ValidationError);
        let fields = api.errors.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path, "items[0].quantity");
    }

    #[test]
    fn test_invalid_transition_code() {
        let api: ApiError = CoreError::InvalidTransition {
            entity: "quotation",
            from: "draft".into(),
            to: "converted".into(),
        }
        .into();

        assert_eq!(api.code, ErrorCode::InvalidTransition);
        assert_eq!(api.message, "Cannot move quotation from draft to converted");
    }

    #[test]
    fn test_db_errors_map() {
        let api: ApiError = DbError::not_found("Quotation", "Q-20260301-0001").into();
        assert_eq!(api.code, ErrorCode::NotFound);

        let api: ApiError = DbError::StatusConflict {
            entity: "quotation",
            id: "Q-1".into(),
            expected: "accepted".into(),
        }
        .into();
        assert_eq!(api.code, ErrorCode::Conflict);

        // Query details stay in the log.
        let api: ApiError = DbError::QueryFailed("near SELECT: syntax error".into()).into();
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(ApiError::not_found("Order", "SO-1")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: SO-1");
        assert!(json.get("errors").is_none());
    }
}
