//! # Inventory Commands
//!
//! Stock checks and picking lists for quotations, plus the low-stock report.
//!
//! ## Check Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quotation lines with a product_id                                      │
//! │       │  (free-text lines such as labour are skipped)                   │
//! │       ▼                                                                 │
//! │  ProductRepository::stock_snapshot(ids)   one query per batch           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_availability(requests, &snapshot)                                │
//! │       │                                                                 │
//! │       ├── unavailable lines? ──► INSUFFICIENT_STOCK for pick lists      │
//! │       ▼                                                                 │
//! │  location_snapshot(ids) ─► generate_picking_list ─► CSV / HTML          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use keystone_core::export::{picking_list_to_csv, picking_list_to_html};
use keystone_core::inventory::AvailabilityRequest;
use keystone_core::{
    check_availability, generate_picking_list, BinLocation, InventoryCheck, PickingList, Quotation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::quotation::load_quotation;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Html,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Html => "text/html",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }
}

/// A rendered picking list, ready to save or print.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickingListExport {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
}

/// One row of the low-stock report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    pub min_stock: i64,
    pub location: Option<BinLocation>,
}

/// Availability requests for the quotation's stocked lines, in line order.
fn availability_requests(quotation: &Quotation) -> Vec<AvailabilityRequest> {
    quotation
        .items
        .iter()
        .filter_map(|item| {
            item.product_id.as_ref().map(|id| AvailabilityRequest {
                product_id: id.clone(),
                quantity: item.quantity,
                product_name: Some(item.name.clone()),
            })
        })
        .collect()
}

/// Runs the availability check against current stock.
pub(crate) async fn inventory_check_for(
    state: &AppState,
    quotation: &Quotation,
) -> ApiResult<InventoryCheck> {
    let requests = availability_requests(quotation);
    let ids: Vec<String> = requests.iter().map(|r| r.product_id.clone()).collect();

    let snapshot = state.db.products().stock_snapshot(&ids).await?;
    let check = check_availability(&requests, &snapshot)?;

    if check.missing_lines().next().is_some() {
        warn!(
            quotation_number = %quotation.quotation_number,
            missing = check.missing_lines().count(),
            "Quotation references products that are unknown or inactive"
        );
    }

    Ok(check)
}

/// Checks whether current stock covers a quotation.
pub async fn check_quotation_inventory(state: &AppState, number: &str) -> ApiResult<InventoryCheck> {
    debug!(quotation_number = %number, "check_quotation_inventory command");

    let quotation = load_quotation(state, number).await?;
    let check = inventory_check_for(state, &quotation).await?;

    info!(
        quotation_number = %number,
        total = check.summary.total_items,
        available = check.summary.available_items,
        unavailable = check.summary.unavailable_items,
        low_stock = check.summary.low_stock_items,
        "Inventory checked"
    );

    Ok(check)
}

/// Builds the picking list for a quotation whose lines are all in stock.
///
/// ## Errors
/// * `INSUFFICIENT_STOCK` - at least one line cannot be filled
pub async fn generate_quotation_picking_list(
    state: &AppState,
    number: &str,
) -> ApiResult<PickingList> {
    debug!(quotation_number = %number, "generate_quotation_picking_list command");

    let quotation = load_quotation(state, number).await?;
    let check = inventory_check_for(state, &quotation).await?;
    check.require_fulfillable()?;

    let ids: Vec<String> = check.lines.iter().map(|l| l.product_id.clone()).collect();
    let locations = state.db.products().location_snapshot(&ids).await?;

    let list = generate_picking_list(&check, &locations, &state.config.picking);

    info!(
        quotation_number = %number,
        lines = list.items.len(),
        units = list.total_items,
        minutes = list.estimated_pick_minutes(),
        "Picking list generated"
    );

    Ok(list)
}

/// Generates and renders a quotation's picking list.
pub async fn export_picking_list(
    state: &AppState,
    number: &str,
    format: ExportFormat,
) -> ApiResult<PickingListExport> {
    let list = generate_quotation_picking_list(state, number).await?;

    let content = match format {
        ExportFormat::Csv => picking_list_to_csv(&list)?,
        ExportFormat::Html => picking_list_to_html(&list, &format!("Picking List {}", number))?,
    };

    Ok(PickingListExport {
        file_name: format!("picking-list-{}.{}", number, format.extension()),
        mime_type: format.mime_type().to_string(),
        content,
    })
}

/// Active products at or below their reorder point, most urgent first.
pub async fn low_stock_report(state: &AppState) -> ApiResult<Vec<LowStockEntry>> {
    debug!("low_stock_report command");

    let products = state.db.products().low_stock().await?;
    Ok(products
        .into_iter()
        .map(|p| LowStockEntry {
            sku: p.sku,
            name: p.name,
            current_stock: p.current_stock,
            min_stock: p.min_stock,
            location: p.location,
        })
        .collect())
}
