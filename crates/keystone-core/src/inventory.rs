//! # Inventory Availability Checker
//!
//! Reconciles requested quantities against on-hand stock before fulfilment.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each request (product_id, requested):                              │
//! │                                                                         │
//! │  record = stock.lookup(product_id)   ── miss ──► current = 0,          │
//! │       │                                          found = false          │
//! │       ▼                                                                 │
//! │  available    = max(current, 0)                                        │
//! │  is_available = available >= requested                                 │
//! │  is_low_stock = current <= min_stock                                   │
//! │  needs_reorder = is_low_stock && is_available                          │
//! │                                                                         │
//! │  ┌──────────────┬──────────────┬────────────────────────────────────┐  │
//! │  │ is_available │ is_low_stock │ bucket                             │  │
//! │  ├──────────────┼──────────────┼────────────────────────────────────┤  │
//! │  │ true         │ false        │ available                          │  │
//! │  │ true         │ true         │ available + low stock (reorder)    │  │
//! │  │ false        │ any          │ unavailable (dominates low stock)  │  │
//! │  └──────────────┴──────────────┴────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A lookup miss never aborts the batch; the line is reported unavailable
//! with `found = false` so staff can review it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::types::StockRecord;
use crate::validation::validate_quantity;

// =============================================================================
// Stock Lookup
// =============================================================================

/// Source of current stock levels.
///
/// The database crate preloads a snapshot per batch; tests use a `HashMap`.
pub trait StockLookup {
    /// Returns the stock record, or `None` if the product is unknown.
    fn stock_record(&self, product_id: &str) -> Option<StockRecord>;
}

impl StockLookup for HashMap<String, StockRecord> {
    fn stock_record(&self, product_id: &str) -> Option<StockRecord> {
        self.get(product_id).cloned()
    }
}

impl<T: StockLookup + ?Sized> StockLookup for &T {
    fn stock_record(&self, product_id: &str) -> Option<StockRecord> {
        (**self).stock_record(product_id)
    }
}

// =============================================================================
// Request / Result Types
// =============================================================================

/// One product and the quantity wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Name to show if the product cannot be found.
    #[serde(default)]
    pub product_name: Option<String>,
}

impl AvailabilityRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        AvailabilityRequest {
            product_id: product_id.into(),
            quantity,
            product_name: None,
        }
    }
}

/// Availability verdict for one request.
///
/// ## Invariant
/// `is_available == (available_quantity >= requested_quantity)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAvailabilityLine {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub requested_quantity: i64,
    pub current_stock: i64,
    pub available_quantity: i64,
    pub min_stock: i64,
    pub is_available: bool,
    pub is_low_stock: bool,
    pub needs_reorder: bool,
    /// False when the stock lookup missed.
    pub found: bool,
}

impl InventoryAvailabilityLine {
    /// Classifies a request against its stock record.
    pub fn classify(request: &AvailabilityRequest, record: Option<StockRecord>) -> Self {
        let found = record.is_some();
        let record = record.unwrap_or_else(|| StockRecord {
            product_id: request.product_id.clone(),
            name: request
                .product_name
                .clone()
                .unwrap_or_else(|| request.product_id.clone()),
            sku: String::new(),
            current_stock: 0,
            min_stock: 0,
        });

        let available_quantity = record.current_stock.max(0);
        let is_available = available_quantity >= request.quantity;
        let is_low_stock = record.current_stock <= record.min_stock;

        InventoryAvailabilityLine {
            product_id: request.product_id.clone(),
            product_name: record.name,
            sku: record.sku,
            requested_quantity: request.quantity,
            current_stock: record.current_stock,
            available_quantity,
            min_stock: record.min_stock,
            is_available,
            is_low_stock,
            needs_reorder: is_low_stock && is_available,
            found,
        }
    }

    /// Units missing to cover the request.
    pub fn shortfall(&self) -> i64 {
        (self.requested_quantity - self.available_quantity).max(0)
    }
}

/// Counts across a batch.
///
/// ## Invariants
/// - `available_items + unavailable_items == total_items`
/// - `low_stock_items <= available_items` (counted among available lines)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckSummary {
    pub total_items: usize,
    pub available_items: usize,
    pub unavailable_items: usize,
    pub low_stock_items: usize,
}

impl InventoryCheckSummary {
    fn from_lines(lines: &[InventoryAvailabilityLine]) -> Self {
        let available_items = lines.iter().filter(|l| l.is_available).count();
        InventoryCheckSummary {
            total_items: lines.len(),
            available_items,
            unavailable_items: lines.len() - available_items,
            low_stock_items: lines.iter().filter(|l| l.needs_reorder).count(),
        }
    }
}

/// Lines plus summary for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheck {
    pub lines: Vec<InventoryAvailabilityLine>,
    pub summary: InventoryCheckSummary,
}

impl InventoryCheck {
    /// True when every line can be picked.
    pub fn can_fulfill(&self) -> bool {
        self.summary.unavailable_items == 0
    }

    /// Returns `StockUnavailable` unless every line is available.
    pub fn require_fulfillable(&self) -> CoreResult<()> {
        if self.can_fulfill() {
            Ok(())
        } else {
            Err(CoreError::StockUnavailable {
                unavailable: self.summary.unavailable_items,
                total: self.summary.total_items,
            })
        }
    }

    pub fn unavailable_lines(&self) -> impl Iterator<Item = &InventoryAvailabilityLine> {
        self.lines.iter().filter(|l| !l.is_available)
    }

    /// Available lines that sit at or below their reorder point.
    pub fn reorder_lines(&self) -> impl Iterator<Item = &InventoryAvailabilityLine> {
        self.lines.iter().filter(|l| l.needs_reorder)
    }

    /// Lines whose product could not be found.
    pub fn missing_lines(&self) -> impl Iterator<Item = &InventoryAvailabilityLine> {
        self.lines.iter().filter(|l| !l.found)
    }
}

// =============================================================================
// Checker
// =============================================================================

/// Checks every request against `stock`.
///
/// ## Errors
/// `CoreError::Validation` if any request has a non-positive quantity
/// (path `requests[i].quantity`). Unknown products are NOT errors.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use keystone_core::inventory::{check_availability, AvailabilityRequest};
/// use keystone_core::types::StockRecord;
///
/// let mut stock = HashMap::new();
/// stock.insert("p1".to_string(), StockRecord {
///     product_id: "p1".into(), name: "Filter".into(), sku: "FLT-1".into(),
///     current_stock: 5, min_stock: 2,
/// });
///
/// let check = check_availability(&[AvailabilityRequest::new("p1", 3)], &stock).unwrap();
/// assert!(check.can_fulfill());
/// assert_eq!(check.summary.low_stock_items, 0);
/// ```
pub fn check_availability<S: StockLookup + ?Sized>(
    requests: &[AvailabilityRequest],
    stock: &S,
) -> CoreResult<InventoryCheck> {
    let mut errors = ValidationErrors::new();
    for (i, request) in requests.iter().enumerate() {
        errors.check(
            &format!("requests[{}]", i),
            validate_quantity(request.quantity),
        );
    }
    errors.into_result()?;

    let lines: Vec<InventoryAvailabilityLine> = requests
        .iter()
        .map(|request| {
            InventoryAvailabilityLine::classify(request, stock.stock_record(&request.product_id))
        })
        .collect();

    let summary = InventoryCheckSummary::from_lines(&lines);
    Ok(InventoryCheck { lines, summary })
}

// =============================================================================
// Unit Tests
// =============================================================================
