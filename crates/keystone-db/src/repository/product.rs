//! # Product Repository
//!
//! Database operations for products, plus the stock and bin snapshots the
//! availability check and picking list generator consume.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Query Per Batch                                  │
//! │                                                                         │
//! │  quotation lines: [p1 ×3, p7 ×1, p9 ×2]                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stock_snapshot(["p1", "p7", "p9"])                                    │
//! │    SELECT ... FROM products WHERE id IN (?, ?, ?) AND is_active = 1    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HashMap<String, StockRecord>  ──► keystone_core::check_availability   │
//! │  (missing ids stay missing → "not found" lines, not errors)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use keystone_core::{BinLocation, Money, Percent, Product, StockRecord};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use super::parse_decimal;
use crate::error::{DbError, DbResult};

/// Stock records keyed by product id.
pub type StockSnapshot = HashMap<String, StockRecord>;

/// Bin locations keyed by product id. Products without a bin are absent.
pub type LocationSnapshot = HashMap<String, BinLocation>;

const PRODUCT_COLUMNS: &str = "id, sku, name, unit_price, tax_rate_percent, \
     current_stock, min_stock, location_zone, location_aisle, location_shelf, \
     location_bin, is_active, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    unit_price: String,
    tax_rate_percent: String,
    current_stock: i64,
    min_stock: i64,
    location_zone: Option<String>,
    location_aisle: Option<String>,
    location_shelf: Option<String>,
    location_bin: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let location = match (
            row.location_zone,
            row.location_aisle,
            row.location_shelf,
            row.location_bin,
        ) {
            (Some(zone), Some(aisle), Some(shelf), Some(bin)) => {
                Some(BinLocation::new(zone, aisle, shelf, bin))
            }
            _ => None,
        };

        Ok(Product {
            unit_price: Money::new(parse_decimal("unit_price", &row.unit_price)?),
            tax_rate_percent: Percent::new(parse_decimal(
                "tax_rate_percent",
                &row.tax_rate_percent,
            )?),
            id: row.id,
            sku: row.sku,
            name: row.name,
            current_stock: row.current_stock,
            min_stock: row.min_stock,
            location,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: String,
    location_zone: String,
    location_aisle: String,
    location_shelf: String,
    location_bin: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        let location = product.location.as_ref();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, unit_price, tax_rate_percent,
                current_stock, min_stock,
                location_zone, location_aisle, location_shelf, location_bin,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.unit_price.amount().to_string())
        .bind(product.tax_rate_percent.value().to_string())
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(location.map(|l| l.zone.as_str()))
        .bind(location.map(|l| l.aisle.as_str()))
        .bind(location.map(|l| l.shelf.as_str()))
        .bind(location.map(|l| l.bin.as_str()))
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by its SKU (e.g., "BRK-PAD-01").
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Counts all products (active and inactive).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Loads stock records for the given products in one query.
    ///
    /// Inactive and unknown ids are left out of the map; the availability
    /// check reports them as not found.
    pub async fn stock_snapshot(&self, ids: &[String]) -> DbResult<StockSnapshot> {
        if ids.is_empty() {
            return Ok(StockSnapshot::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, name, sku, current_stock, min_stock FROM products WHERE is_active = 1 AND id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String, String, i64, i64)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = rows.len(), "Loaded stock snapshot");

        Ok(rows
            .into_iter()
            .map(|(id, name, sku, current_stock, min_stock)| {
                let record = StockRecord {
                    product_id: id.clone(),
                    name,
                    sku,
                    current_stock,
                    min_stock,
                };
                (id, record)
            })
            .collect())
    }

    /// Loads bin locations for the given products in one query.
    pub async fn location_snapshot(&self, ids: &[String]) -> DbResult<LocationSnapshot> {
        if ids.is_empty() {
            return Ok(LocationSnapshot::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, location_zone, location_aisle, location_shelf, location_bin \
             FROM products WHERE location_zone IS NOT NULL AND id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<LocationRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let location = BinLocation::new(
                    row.location_zone,
                    row.location_aisle,
                    row.location_shelf,
                    row.location_bin,
                );
                (row.id, location)
            })
            .collect())
    }

    /// Assigns (or clears) a product's bin location.
    pub async fn set_location(&self, id: &str, location: Option<&BinLocation>) -> DbResult<()> {
        debug!(id = %id, location = ?location.map(ToString::to_string), "Setting bin location");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                location_zone = ?2,
                location_aisle = ?3,
                location_shelf = ?4,
                location_bin = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(location.map(|l| l.zone.as_str()))
        .bind(location.map(|l| l.aisle.as_str()))
        .bind(location.map(|l| l.shelf.as_str()))
        .bind(location.map(|l| l.bin.as_str()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Changes stock by `delta` (negative for picks, positive for receipts).
    ///
    /// Relative update, so concurrent adjustments add up instead of
    /// overwriting each other. Returns the new stock level.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            RETURNING current_stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        new_stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Active products at or below their reorder point, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND current_stock <= min_stock \
             ORDER BY current_stock - min_stock, name"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    pub(crate) fn product(sku: &str, stock: i64, min: i64, location: Option<BinLocation>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("Part {sku}"),
            unit_price: Money::new(dec!(12.50)),
            tax_rate_percent: Percent::new(dec!(8.25)),
            current_stock: stock,
            min_stock: min,
            location,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let db = db().await;
        let bin = BinLocation::new("A", "01", "2", "C");
        let inserted = db
            .products()
            .insert(&product("BRK-01", 5, 2, Some(bin.clone())))
            .await
            .unwrap();

        let by_id = db.products().get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id.unit_price, Money::new(dec!(12.50)));
        assert_eq!(by_id.tax_rate_percent, Percent::new(dec!(8.25)));
        assert_eq!(by_id.location, Some(bin));

        let by_sku = db.products().get_by_sku("BRK-01").await.unwrap().unwrap();
        assert_eq!(by_sku.id, inserted.id);
        assert!(db.products().get_by_sku("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = db().await;
        db.products().insert(&product("DUP-1", 1, 0, None)).await.unwrap();
        let err = db
            .products()
            .insert(&product("DUP-1", 1, 0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_snapshot_skips_unknown_and_inactive() {
        let db = db().await;
        let active = db.products().insert(&product("ACT-1", 5, 2, None)).await.unwrap();
        let mut inactive = product("OLD-1", 9, 0, None);
        inactive.is_active = false;
        let inactive = db.products().insert(&inactive).await.unwrap();

        let ids = vec![active.id.clone(), inactive.id.clone(), "missing".to_string()];
        let snapshot = db.products().stock_snapshot(&ids).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&active.id].current_stock, 5);
        assert_eq!(snapshot[&active.id].min_stock, 2);
        assert!(db.products().stock_snapshot(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_location_snapshot_only_located_products() {
        let db = db().await;
        let located = db
            .products()
            .insert(&product("LOC-1", 1, 0, Some(BinLocation::new("B", "03", "1", "A"))))
            .await
            .unwrap();
        let floating = db.products().insert(&product("LOC-2", 1, 0, None)).await.unwrap();

        let ids = vec![located.id.clone(), floating.id.clone()];
        let snapshot = db.products().location_snapshot(&ids).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&located.id].to_string(), "B-03-1-A");

        db.products().set_location(&floating.id, Some(&BinLocation::new("A", "01", "1", "A"))).await.unwrap();
        let snapshot = db.products().location_snapshot(&ids).await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_stock_is_relative() {
        let db = db().await;
        let p = db.products().insert(&product("ADJ-1", 10, 2, None)).await.unwrap();

        assert_eq!(db.products().adjust_stock(&p.id, -3).await.unwrap(), 7);
        assert_eq!(db.products().adjust_stock(&p.id, 5).await.unwrap(), 12);

        let err = db.products().adjust_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_lists_at_or_below_reorder_point() {
        let db = db().await;
        db.products().insert(&product("OK-1", 10, 2, None)).await.unwrap();
        db.products().insert(&product("EDGE-1", 2, 2, None)).await.unwrap();
        db.products().insert(&product("NEG-1", -1, 3, None)).await.unwrap();

        let low = db.products().low_stock().await.unwrap();
        let skus: Vec<&str> = low.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["NEG-1", "EDGE-1"]);
        assert_eq!(db.products().count().await.unwrap(), 3);
    }
}
