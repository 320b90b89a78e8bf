//! # Commands Module
//!
//! Every operation the back office exposes. Each command loads what it needs
//! through `keystone-db`, hands it to the pure `keystone-core` functions and
//! persists the outcome.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── pricing.rs    ◄─── Price a basket of lines
//! ├── quotation.rs  ◄─── Create, move and expire quotations
//! ├── inventory.rs  ◄─── Stock checks, picking lists, low stock
//! └── order.rs      ◄─── Conversion and order lifecycle
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  caller (CLI or embedding app)                                          │
//! │       │  convert_quotation_to_order(&state, "Q-20260301-0004")          │
//! │       ▼                                                                 │
//! │  keystone-db   load quotation, stock snapshot                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  keystone-core transition check, check_availability                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  keystone-db   guarded status update + order insert (one transaction)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<Order, ApiError>                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands take `&AppState` first, then plain request values. Request and
//! response types are serde types in camelCase so they can cross an IPC or
//! HTTP boundary unchanged.

pub mod inventory;
pub mod order;
pub mod pricing;
pub mod quotation;

pub use inventory::{
    check_quotation_inventory, export_picking_list, generate_quotation_picking_list,
    low_stock_report, ExportFormat, LowStockEntry, PickingListExport,
};
pub use order::{
    assign_order_warehouse, convert_quotation_to_order, transition_order,
    update_order_payment_status,
};
pub use pricing::{price_items, PriceItemsRequest, PriceItemsResponse};
pub use quotation::{
    create_quotation, expire_quotations, transition_quotation, CreateQuotationRequest,
};
