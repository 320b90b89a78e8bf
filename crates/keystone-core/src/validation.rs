//! # Validation Module
//!
//! Input validation for payloads that reach the core.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form (TypeScript)                                        │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command (Rust)                                               │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: collect every rule violation into one list           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-field validators return the first failure for that field.
//! Payload validators ([`validate_line_items`], [`validate_quotation_draft`])
//! keep going and return a [`ValidationErrors`] list with field paths.

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{Customer, LineItem};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY, MAX_MONEY_AMOUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ```rust
/// use keystone_core::validation::validate_sku;
///
/// assert!(validate_sku("BRK-PAD-01").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, line item, customer).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or request quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
///
/// ```text
/// qty <= 0        → "quantity must be positive"
/// qty > 100000    → "quantity must be between 1 and 100000"
/// otherwise       → OK
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_LINE_QUANTITY.to_string(),
        });
    }

    Ok(())
}

/// Validates a price, fee or fixed adjustment.
///
/// ## Rules
/// - Must not be negative; zero is allowed (free items, waived shipping)
/// - Must not exceed [`MAX_MONEY_AMOUNT`]
///
/// ```rust
/// use keystone_core::money::Money;
/// use keystone_core::validation::validate_money_amount;
///
/// assert!(validate_money_amount("unitPrice", Money::zero()).is_ok());
/// assert!(validate_money_amount("unitPrice", Money::from_major(-1)).is_err());
/// assert!(validate_money_amount("unitPrice", Money::from_major(1_000_000_001)).is_err());
/// ```
pub fn validate_money_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if amount > Money::from_major(MAX_MONEY_AMOUNT) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: MAX_MONEY_AMOUNT.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock threshold (reorder point).
pub fn validate_min_stock(min_stock: i64) -> ValidationResult<()> {
    if min_stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "min stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use keystone_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates one line item, recording failures under `prefix`.
pub fn collect_line_item_errors(prefix: &str, item: &LineItem, errors: &mut ValidationErrors) {
    errors.check(prefix, validate_name("name", &item.name));
    errors.check(prefix, validate_quantity(item.quantity));
    errors.check(
        prefix,
        validate_money_amount("unitPrice", item.unit_price),
    );
    if let Some(discount) = item.discount_percent {
        errors.check(prefix, discount.validate("discountPercent"));
    }
    if let Some(tax) = item.tax_rate_percent {
        errors.check(prefix, tax.validate("taxRatePercent"));
    }
}

/// Validates a list of line items.
///
/// An empty list is valid (it prices to zero). Every failing field is
/// reported, each with an `items[i].field` path.
///
/// ```rust
/// use keystone_core::money::Money;
/// use keystone_core::types::LineItem;
/// use keystone_core::validation::validate_line_items;
///
/// let items = vec![
///     LineItem::new("Filter", 0, Money::from_major(5)),
///     LineItem::new("", 1, Money::from_major(-1)),
/// ];
/// let errors = validate_line_items(&items).unwrap_err();
/// assert_eq!(errors.len(), 3);
/// assert_eq!(errors.errors[0].path, "items[0].quantity");
/// ```
pub fn validate_line_items(items: &[LineItem]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if items.len() > MAX_LINE_ITEMS {
        errors.push(
            "",
            ValidationError::OutOfRange {
                field: "items".to_string(),
                min: "0".to_string(),
                max: MAX_LINE_ITEMS.to_string(),
            },
        );
    }

    for (i, item) in items.iter().enumerate() {
        collect_line_item_errors(&format!("items[{}]", i), item, &mut errors);
    }

    errors.into_result()
}

/// Validates a new quotation: customer plus at least one valid line.
pub fn validate_quotation_draft(
    customer: &Customer,
    items: &[LineItem],
) -> Result<(), ValidationErrors> {
    let mut errors = match validate_line_items(items) {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    errors.check("customer", validate_name("name", &customer.name));

    if items.is_empty() {
        errors.push(
            "",
            ValidationError::Required {
                field: "items".to_string(),
            },
        );
    }

    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================
