//! # Order Repository
//!
//! Database operations for sales orders.
//!
//! ## Conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              convert_quotation (one transaction)                        │
//! │                                                                         │
//! │  1. UPDATE quotations SET status = 'converted'                         │
//! │     WHERE id = ? AND status = 'accepted'     ── 0 rows → rollback      │
//! │                                                                         │
//! │  2. INSERT INTO orders (... quotation_id UNIQUE ...)                   │
//! │                                                                         │
//! │  3. COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Either both rows change or neither does, and a quotation can only ever
//! produce one order.

use chrono::{DateTime, Utc};
use keystone_core::{
    Customer, FulfillmentStatus, Order, OrderStatus, PaymentStatus, Quotation, QuotationStatus,
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{from_json, next_document_number, to_json};
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, order_number, quotation_id, customer_name, customer_email, \
     customer_phone, items_json, status, payment_status, fulfillment_status, warehouse, \
     totals_json, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    quotation_id: Option<String>,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    items_json: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    fulfillment_status: FulfillmentStatus,
    warehouse: Option<String>,
    totals_json: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            items: from_json("items_json", &row.items_json)?,
            totals: from_json("totals_json", &row.totals_json)?,
            id: row.id,
            order_number: row.order_number,
            quotation_id: row.quotation_id,
            customer: Customer {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            status: row.status,
            payment_status: row.payment_status,
            fulfillment_status: row.fulfillment_status,
            warehouse: row.warehouse,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Marks an accepted quotation converted and creates its order, atomically.
    ///
    /// The order copies the quotation's customer, items and totals and starts
    /// as pending / unpaid / unfulfilled. `warehouse` pre-assigns a default
    /// warehouse when one is configured.
    ///
    /// ## Returns
    /// * `Err(DbError::StatusConflict)` - quotation is no longer accepted
    /// * `Err(DbError::NotFound)` - quotation does not exist
    pub async fn convert_quotation(
        &self,
        quotation: &Quotation,
        number_prefix: &str,
        warehouse: Option<&str>,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let order_number = next_document_number(
            &self.pool,
            "orders",
            "order_number",
            number_prefix,
            now.date_naive(),
        )
        .await?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number,
            quotation_id: Some(quotation.id.clone()),
            customer: quotation.customer.clone(),
            items: quotation.items.clone(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            fulfillment_status: FulfillmentStatus::Unfulfilled,
            warehouse: warehouse.map(str::to_string),
            totals: quotation.totals.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            quotation_number = %quotation.quotation_number,
            order_number = %order.order_number,
            "Converting quotation to order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let marked = sqlx::query(
            "UPDATE quotations SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(&quotation.id)
        .bind(QuotationStatus::Accepted)
        .bind(QuotationStatus::Converted)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT id FROM quotations WHERE id = ?1")
                    .bind(&quotation.id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

            return Err(match exists {
                Some(_) => DbError::StatusConflict {
                    entity: "quotation",
                    id: quotation.quotation_number.clone(),
                    expected: QuotationStatus::Accepted.to_string(),
                },
                None => DbError::not_found("Quotation", &quotation.id),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, quotation_id,
                customer_name, customer_email, customer_phone,
                items_json, status, payment_status, fulfillment_status,
                warehouse, totals_json, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.quotation_id)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(to_json("items_json", &order.items)?)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.fulfillment_status)
        .bind(&order.warehouse)
        .bind(to_json("totals_json", &order.totals)?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            quotation_number = %quotation.quotation_number,
            order_number = %order.order_number,
            "Quotation converted"
        );

        Ok(order)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets an order by its business number (e.g., "SO-20260301-0002").
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Records `from → to`, only if the order is still in `from`.
    ///
    /// `fulfillment` moves the fulfilment status in the same statement.
    pub async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        fulfillment: Option<FulfillmentStatus>,
    ) -> DbResult<()> {
        debug!(id = %id, from = %from, to = %to, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                fulfillment_status = COALESCE(?4, fulfillment_status),
                updated_at = ?5
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(fulfillment)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match self.get_by_id(id).await? {
                Some(_) => DbError::StatusConflict {
                    entity: "order",
                    id: id.to_string(),
                    expected: from.to_string(),
                },
                None => DbError::not_found("Order", id),
            });
        }
        Ok(())
    }

    /// Assigns the warehouse the order ships from.
    ///
    /// Only orders that have not shipped or closed are updated; the check
    /// runs in the same statement as the write. A row that exists but has
    /// moved on gives `StatusConflict`.
    pub async fn assign_warehouse(&self, id: &str, warehouse: &str) -> DbResult<()> {
        debug!(id = %id, warehouse = %warehouse, "Assigning warehouse");

        let result = sqlx::query(
            r#"
            UPDATE orders SET warehouse = ?2, updated_at = ?3
            WHERE id = ?1
              AND status NOT IN ('shipped', 'delivered', 'cancelled', 'returned')
            "#,
        )
        .bind(id)
        .bind(warehouse)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match self.get_by_id(id).await? {
                Some(_) => DbError::StatusConflict {
                    entity: "order",
                    id: id.to_string(),
                    expected: "open".to_string(),
                },
                None => DbError::not_found("Order", id),
            });
        }
        Ok(())
    }

    pub async fn update_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<()> {
        debug!(id = %id, payment_status = ?status, "Updating payment status");

        let result =
            sqlx::query("UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::quotation::tests::new_quotation;
    use chrono::NaiveDate;

    async fn accepted_quotation(db: &Database) -> Quotation {
        let repo = db.quotations();
        let valid_until = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let q = repo.create(new_quotation(valid_until), "Q").await.unwrap();
        repo.update_status(&q.id, QuotationStatus::Draft, QuotationStatus::Sent)
            .await
            .unwrap();
        repo.update_status(&q.id, QuotationStatus::Sent, QuotationStatus::Accepted)
            .await
            .unwrap();
        repo.get_by_id(&q.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_convert_creates_order_and_marks_quotation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let quotation = accepted_quotation(&db).await;

        let order = db
            .orders()
            .convert_quotation(&quotation, "SO", Some("Main"))
            .await
            .unwrap();

        assert!(order.order_number.starts_with("SO-"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.warehouse.as_deref(), Some("Main"));
        assert_eq!(order.totals, quotation.totals);

        let stored = db.orders().get_by_number(&order.order_number).await.unwrap().unwrap();
        assert_eq!(stored.quotation_id.as_deref(), Some(quotation.id.as_str()));
        assert_eq!(stored.items, quotation.items);

        let reloaded = db.quotations().get_by_id(&quotation.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, QuotationStatus::Converted);
    }

    #[tokio::test]
    async fn test_second_conversion_conflicts_and_leaves_no_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let quotation = accepted_quotation(&db).await;

        db.orders().convert_quotation(&quotation, "SO", None).await.unwrap();
        let err = db
            .orders()
            .convert_quotation(&quotation, "SO", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { .. }));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_status_fulfillment_and_payment_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let quotation = accepted_quotation(&db).await;
        let order = db.orders().convert_quotation(&quotation, "SO", None).await.unwrap();
        let repo = db.orders();

        repo.update_status(&order.id, OrderStatus::Pending, OrderStatus::Confirmed, None)
            .await
            .unwrap();
        repo.assign_warehouse(&order.id, "North").await.unwrap();
        repo.update_status(
            &order.id,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            Some(FulfillmentStatus::Picking),
        )
        .await
        .unwrap();
        repo.update_payment_status(&order.id, PaymentStatus::PartiallyPaid)
            .await
            .unwrap();

        let stored = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.fulfillment_status, FulfillmentStatus::Picking);
        assert_eq!(stored.payment_status, PaymentStatus::PartiallyPaid);
        assert_eq!(stored.warehouse.as_deref(), Some("North"));

        let err = repo
            .update_status(&order.id, OrderStatus::Pending, OrderStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { .. }));

        let err = repo.assign_warehouse("missing", "North").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_warehouse_locked_once_shipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let quotation = accepted_quotation(&db).await;
        let order = db
            .orders()
            .convert_quotation(&quotation, "SO", Some("North"))
            .await
            .unwrap();
        let repo = db.orders();

        let steps = [
            (OrderStatus::Pending, OrderStatus::Confirmed),
            (OrderStatus::Confirmed, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::Shipped),
        ];
        for (from, to) in steps {
            repo.update_status(&order.id, from, to, None).await.unwrap();
        }

        let err = repo.assign_warehouse(&order.id, "South").await.unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { entity: "order", .. }));

        let stored = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.warehouse.as_deref(), Some("North"));
    }
}
