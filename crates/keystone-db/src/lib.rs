//! # keystone-db: Database Layer for Keystone Workshop
//!
//! SQLite storage for products, quotations and orders, using sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Keystone Data Flow                                  │
//! │                                                                         │
//! │  keystone-app command (check_quotation_inventory)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    keystone-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductRepo     │   │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ QuotationRepo   │   │ 001_init.sql │  │   │
//! │  │   │               │    │ OrderRepo       │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼  StockSnapshot / LocationSnapshot                               │
//! │  keystone-core (check_availability, generate_picking_list)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keystone_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("keystone.db")).await?;
//! let quotation = db.quotations().get_by_number("Q-20260301-0004").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::order::OrderRepository;
pub use repository::product::{LocationSnapshot, ProductRepository, StockSnapshot};
pub use repository::quotation::{NewQuotation, QuotationRepository};
