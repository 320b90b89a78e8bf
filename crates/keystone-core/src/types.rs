//! # Domain Types
//!
//! Core domain types shared by the pricing, stock and workflow modules.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Quotation     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  number Q-...   │   │  number SO-...  │       │
//! │  │  unit_price     │   │  status         │   │  status         │       │
//! │  │  current_stock  │   │  items[]        │   │  items[]        │       │
//! │  │  min_stock      │   │  valid_until    │   │  warehouse?     │       │
//! │  │  location?      │   │  totals         │   │  totals         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │  StockRecord    │   │  BinLocation    │       │
//! │  │  name, qty      │   │  current, min   │   │  zone, aisle    │       │
//! │  │  unit_price     │   │  (lookup result)│   │  shelf, bin     │       │
//! │  │  discount/tax % │   │                 │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, quotation_number, order_number) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{Money, Percent};
use crate::pricing::PriceCalculation;
use crate::workflow::{FulfillmentStatus, OrderStatus, PaymentStatus, QuotationStatus};

// =============================================================================
// Line Item
// =============================================================================

/// One product/quantity/price row of a quotation, order or purchase order.
///
/// Built per pricing request. `product_id` is absent for free-text lines
/// (labour, call-out fees) that never touch stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount_percent: Option<Percent>,
    #[serde(default)]
    pub tax_rate_percent: Option<Percent>,
}

impl LineItem {
    /// Creates a line with no discount and no tax.
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        LineItem {
            product_id: None,
            name: name.into(),
            quantity,
            unit_price,
            discount_percent: None,
            tax_rate_percent: None,
        }
    }

    /// Builder: links the line to a stocked product.
    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Builder: sets the line discount.
    pub fn with_discount(mut self, pct: Percent) -> Self {
        self.discount_percent = Some(pct);
        self
    }

    /// Builder: sets the line tax rate.
    pub fn with_tax(mut self, pct: Percent) -> Self {
        self.tax_rate_percent = Some(pct);
        self
    }

    /// Line discount, 0% when unset.
    #[inline]
    pub fn discount(&self) -> Percent {
        self.discount_percent.unwrap_or_default()
    }

    /// Line tax rate, 0% when unset.
    #[inline]
    pub fn tax_rate(&self) -> Percent {
        self.tax_rate_percent.unwrap_or_default()
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Customer {
    pub fn named(name: impl Into<String>) -> Self {
        Customer {
            name: name.into(),
            email: None,
            phone: None,
        }
    }
}

// =============================================================================
// Warehouse Location
// =============================================================================

/// Where a product sits in the warehouse.
///
/// Field order matters: the derived `Ord` compares zone, then aisle, then
/// shelf, then bin, which is the walking order used for picking lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BinLocation {
    pub zone: String,
    pub aisle: String,
    pub shelf: String,
    pub bin: String,
}

impl BinLocation {
    pub fn new(
        zone: impl Into<String>,
        aisle: impl Into<String>,
        shelf: impl Into<String>,
        bin: impl Into<String>,
    ) -> Self {
        BinLocation {
            zone: zone.into(),
            aisle: aisle.into(),
            shelf: shelf.into(),
            bin: bin.into(),
        }
    }
}

impl fmt::Display for BinLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.zone, self.aisle, self.shelf, self.bin)
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// What a stock lookup returns for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    /// May be negative after oversells or stock corrections.
    pub current_stock: i64,
    /// Reorder point.
    pub min_stock: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown on quotations and pick lists.
    pub name: String,

    /// List price per unit.
    pub unit_price: Money,

    /// Default tax rate applied when the product is quoted.
    pub tax_rate_percent: Percent,

    /// Units on hand.
    pub current_stock: i64,

    /// Reorder point.
    pub min_stock: i64,

    /// Bin location, if staff assigned one.
    pub location: Option<BinLocation>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Projects the product onto the record the availability check reads.
    pub fn stock_record(&self) -> StockRecord {
        StockRecord {
            product_id: self.id.clone(),
            name: self.name.clone(),
            sku: self.sku.clone(),
            current_stock: self.current_stock,
            min_stock: self.min_stock,
        }
    }

    /// Builds a quotation line at list price with the product's tax rate.
    pub fn line_item(&self, quantity: i64) -> LineItem {
        LineItem::new(self.name.clone(), quantity, self.unit_price)
            .with_product(self.id.clone())
            .with_tax(self.tax_rate_percent)
    }

    /// Stock at or below the reorder point.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// A priced offer to a customer.
///
/// ## Lifecycle
/// ```text
/// draft ──► sent ──► viewed ──► accepted ──► converted (→ Order)
///             │         │
///             └────┬────┘
///                  ▼
///              rejected          any open state ──(past valid_until)──► expired
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub quotation_number: String,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub status: QuotationStatus,
    #[ts(as = "String")]
    pub valid_until: NaiveDate,
    pub totals: PriceCalculation,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    /// True once `today` is past the last valid day.
    pub fn is_past_validity(&self, today: NaiveDate) -> bool {
        today > self.valid_until
    }

    /// Lines that reference stocked products, as (product_id, quantity).
    pub fn stocked_lines(&self) -> Vec<(String, i64)> {
        self.items
            .iter()
            .filter_map(|item| {
                item.product_id
                    .as_ref()
                    .map(|id| (id.clone(), item.quantity))
            })
            .collect()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A sales order, usually created by converting an accepted quotation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    /// Quotation this order was converted from.
    pub quotation_id: Option<String>,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// Assigned by staff; required before processing starts.
    pub warehouse: Option<String>,
    pub totals: PriceCalculation,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
