//! # keystone-core: Pure Business Logic for Keystone Workshop
//!
//! Pricing, stock availability, picking lists and status workflows for the
//! workshop back office, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Keystone Workshop Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 keystone-app (commands, CLI)                    │   │
//! │  │   price_items, check_quotation_inventory, convert_quotation...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ keystone-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌───────────┐ ┌─────────┐ ┌──────────┐ ┌──────┐  │   │
//! │  │   │ pricing │ │ inventory │ │ picking │ │ workflow │ │export│  │   │
//! │  │   └─────────┘ └───────────┘ └─────────┘ └──────────┘ └──────┘  │   │
//! │  │   money • types • validation • error                          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ StockLookup / LocationLookup           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 keystone-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, stock/bin snapshots          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal `Money` and `Percent`
//! - [`types`] - Line items, products, quotations, orders
//! - [`pricing`] - Subtotal, discounts, taxes, shipping, grand total
//! - [`inventory`] - Availability check against a stock lookup
//! - [`picking`] - Picking list generation and pick time estimate
//! - [`workflow`] - Quotation and order state machines
//! - [`export`] - Picking list CSV and HTML
//! - [`validation`] - Field-level input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use keystone_core::money::{Money, Percent};
//! use keystone_core::pricing::{calculate_price, PriceAdjustments};
//! use keystone_core::types::LineItem;
//!
//! let items = vec![LineItem::new("Brake pad", 2, Money::from_major(10))
//!     .with_discount(Percent::from_whole(10))
//!     .with_tax(Percent::from_whole(5))];
//!
//! let calc = calculate_price(&items, &PriceAdjustments::none()).unwrap();
//! assert_eq!(calc.grand_total.to_string(), "$18.90");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod inventory;
pub mod money;
pub mod picking;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod workflow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FieldError, ValidationError, ValidationErrors};
pub use inventory::{check_availability, AvailabilityRequest, InventoryCheck, StockLookup};
pub use money::{Money, Percent};
pub use picking::{generate_picking_list, LocationLookup, PickTimeConfig, PickingList};
pub use pricing::{calculate_price, PriceAdjustments, PriceCalculation};
pub use types::*;
pub use workflow::{
    FulfillmentStatus, OrderAction, OrderStatus, PaymentStatus, QuotationAction, QuotationStatus,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on one quotation or order.
pub const MAX_LINE_ITEMS: usize = 500;

/// Maximum quantity on a single line.
///
/// Catches typos like 10000 for 10 before they reach stock checks.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Largest unit price, fee or fixed adjustment accepted, in currency units.
///
/// With [`MAX_LINE_ITEMS`] and [`MAX_LINE_QUANTITY`] this keeps every total
/// below 5 × 10^16, far inside the `Decimal` range.
pub const MAX_MONEY_AMOUNT: i64 = 1_000_000_000;

/// Days a new quotation stays valid unless configured otherwise.
pub const DEFAULT_QUOTATION_VALIDITY_DAYS: u32 = 30;
