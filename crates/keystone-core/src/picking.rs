//! # Picking List Generator
//!
//! Turns a passing availability check into walk-ordered pick instructions.
//!
//! ## Flow
//! ```text
//! InventoryCheck (unavailable_items == 0)
//!      │
//!      ▼
//! generate_picking_list() ← THIS MODULE
//!      │
//!      ├── priority per line   (short → high, low stock → high, else normal)
//!      ├── location per line   (LocationLookup, may be unassigned)
//!      ├── sort by zone → aisle → shelf → bin, unassigned last
//!      └── pick time  Σ base + per_unit × (qty − 1)
//!      │
//!      ▼
//! PickingList ──► CSV / print HTML (export module)
//! ```
//!
//! ## Contract
//! Callers only generate a list after a check with zero unavailable lines.
//! The generator trusts that; it does not re-check stock. A short line that
//! slips through is still listed, flagged `high`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::inventory::{InventoryAvailabilityLine, InventoryCheck};
use crate::types::BinLocation;

// =============================================================================
// Configuration
// =============================================================================

/// Pick-time estimation constants.
///
/// Loaded from the `[picking]` section of the app config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PickTimeConfig {
    /// Walking to the bin and scanning the first unit.
    #[serde(default = "default_base_seconds")]
    pub base_seconds_per_line: u64,

    /// Each unit after the first.
    #[serde(default = "default_unit_seconds")]
    pub seconds_per_additional_unit: u64,
}

fn default_base_seconds() -> u64 {
    60
}

fn default_unit_seconds() -> u64 {
    5
}

impl Default for PickTimeConfig {
    fn default() -> Self {
        PickTimeConfig {
            base_seconds_per_line: default_base_seconds(),
            seconds_per_additional_unit: default_unit_seconds(),
        }
    }
}

impl PickTimeConfig {
    /// Seconds to pick `quantity` units of one line, saturating at `u64::MAX`.
    pub fn seconds_for(&self, quantity: i64) -> u64 {
        let extra_units = quantity.saturating_sub(1).max(0) as u64;
        self.base_seconds_per_line
            .saturating_add(self.seconds_per_additional_unit.saturating_mul(extra_units))
    }
}

// =============================================================================
// Location Lookup
// =============================================================================

/// Source of bin locations.
pub trait LocationLookup {
    /// Returns the bin for a product, or `None` if none is assigned.
    fn location(&self, product_id: &str) -> Option<BinLocation>;
}

impl LocationLookup for HashMap<String, BinLocation> {
    fn location(&self, product_id: &str) -> Option<BinLocation> {
        self.get(product_id).cloned()
    }
}

impl<T: LocationLookup + ?Sized> LocationLookup for &T {
    fn location(&self, product_id: &str) -> Option<BinLocation> {
        (**self).location(product_id)
    }
}

// =============================================================================
// Picking List Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PickPriority {
    High,
    Normal,
    Low,
}

impl PickPriority {
    /// First matching rule wins:
    /// 1. requested > available → high
    /// 2. low stock → high
    /// 3. normal
    pub fn for_line(line: &InventoryAvailabilityLine) -> Self {
        if line.requested_quantity > line.available_quantity || line.is_low_stock {
            PickPriority::High
        } else {
            PickPriority::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickPriority::High => "High",
            PickPriority::Normal => "Normal",
            PickPriority::Low => "Low",
        }
    }
}

impl fmt::Display for PickPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One instruction for the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PickingListItem {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub quantity: i64,
    pub location: Option<BinLocation>,
    pub priority: PickPriority,
}

impl PickingListItem {
    /// Location as `zone-aisle-shelf-bin`, or `Unassigned`.
    pub fn location_label(&self) -> String {
        self.location
            .as_ref()
            .map(BinLocation::to_string)
            .unwrap_or_else(|| "Unassigned".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PickingList {
    pub items: Vec<PickingListItem>,
    /// Units to pick across all lines.
    pub total_items: i64,
    /// Seconds.
    pub estimated_pick_time: u64,
}

impl PickingList {
    /// Estimated pick time in whole minutes, rounded up.
    pub fn estimated_pick_minutes(&self) -> u64 {
        self.estimated_pick_time.div_ceil(60)
    }

    pub fn high_priority_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.priority == PickPriority::High)
            .count()
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Builds the picking list for a passing availability check.
///
/// One item per availability line, quantity = requested quantity, sorted by
/// bin location (stable, unassigned bins last).
///
/// ```rust
/// use std::collections::HashMap;
/// use keystone_core::inventory::{check_availability, AvailabilityRequest};
/// use keystone_core::picking::{generate_picking_list, PickTimeConfig};
/// use keystone_core::types::{BinLocation, StockRecord};
///
/// let stock: HashMap<String, StockRecord> = [("p1".to_string(), StockRecord {
///     product_id: "p1".into(), name: "Filter".into(), sku: "FLT-1".into(),
///     current_stock: 10, min_stock: 2,
/// })].into_iter().collect();
/// let bins: HashMap<String, BinLocation> =
///     [("p1".to_string(), BinLocation::new("A", "01", "2", "C"))].into_iter().collect();
///
/// let check = check_availability(&[AvailabilityRequest::new("p1", 3)], &stock).unwrap();
/// let list = generate_picking_list(&check, &bins, &PickTimeConfig::default());
///
/// assert_eq!(list.items[0].location_label(), "A-01-2-C");
/// assert_eq!(list.estimated_pick_time, 70); // 60 + 2 × 5
/// ```
pub fn generate_picking_list<L: LocationLookup + ?Sized>(
    check: &InventoryCheck,
    locations: &L,
    config: &PickTimeConfig,
) -> PickingList {
    let mut items: Vec<PickingListItem> = check
        .lines
        .iter()
        .map(|line| PickingListItem {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            sku: line.sku.clone(),
            quantity: line.requested_quantity,
            location: locations.location(&line.product_id),
            priority: PickPriority::for_line(line),
        })
        .collect();

    // None sorts first for Option, so key on (is_none, location) to put
    // unassigned bins at the end.
    items.sort_by(|a, b| {
        (a.location.is_none(), &a.location).cmp(&(b.location.is_none(), &b.location))
    });

    let total_items = items
        .iter()
        .fold(0i64, |acc, i| acc.saturating_add(i.quantity));
    let estimated_pick_time = items
        .iter()
        .fold(0u64, |acc, i| acc.saturating_add(config.seconds_for(i.quantity)));

    PickingList {
        items,
        total_items,
        estimated_pick_time,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
