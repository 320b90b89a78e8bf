//! # Quotation Repository
//!
//! Database operations for quotations.
//!
//! ## Guarded Status Updates
//! ```text
//! UPDATE quotations SET status = 'sent'
//! WHERE id = ?1 AND status = 'draft'      ← the status the caller saw
//!
//! rows_affected = 1 → transition recorded
//! rows_affected = 0 → row gone (NotFound) or someone moved it (StatusConflict)
//! ```
//! The repository does not decide which transitions are legal; commands ask
//! `keystone_core::workflow` first and then record the result here.

use chrono::{DateTime, NaiveDate, Utc};
use keystone_core::{
    Customer, LineItem, PriceCalculation, Quotation, QuotationAction, QuotationStatus,
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{from_json, next_document_number, to_json};
use crate::error::{DbError, DbResult};

const QUOTATION_COLUMNS: &str = "id, quotation_number, customer_name, customer_email, \
     customer_phone, items_json, status, valid_until, totals_json, notes, created_at, updated_at";

/// Input for [`QuotationRepository::create`].
#[derive(Debug, Clone)]
pub struct NewQuotation {
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub totals: PriceCalculation,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct QuotationRow {
    id: String,
    quotation_number: String,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    items_json: String,
    status: QuotationStatus,
    valid_until: NaiveDate,
    totals_json: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuotationRow> for Quotation {
    type Error = DbError;

    fn try_from(row: QuotationRow) -> DbResult<Self> {
        Ok(Quotation {
            items: from_json("items_json", &row.items_json)?,
            totals: from_json("totals_json", &row.totals_json)?,
            id: row.id,
            quotation_number: row.quotation_number,
            customer: Customer {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            status: row.status,
            valid_until: row.valid_until,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for quotation database operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    /// Stores a new draft quotation under the next `PREFIX-YYYYMMDD-NNNN`
    /// number for today.
    pub async fn create(&self, new: NewQuotation, number_prefix: &str) -> DbResult<Quotation> {
        let now = Utc::now();
        let quotation_number = next_document_number(
            &self.pool,
            "quotations",
            "quotation_number",
            number_prefix,
            now.date_naive(),
        )
        .await?;

        let quotation = Quotation {
            id: Uuid::new_v4().to_string(),
            quotation_number,
            customer: new.customer,
            items: new.items,
            status: QuotationStatus::Draft,
            valid_until: new.valid_until,
            totals: new.totals,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %quotation.id,
            quotation_number = %quotation.quotation_number,
            lines = quotation.items.len(),
            "Creating quotation"
        );

        sqlx::query(
            r#"
            INSERT INTO quotations (
                id, quotation_number,
                customer_name, customer_email, customer_phone,
                items_json, status, valid_until, totals_json, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12
            )
            "#,
        )
        .bind(&quotation.id)
        .bind(&quotation.quotation_number)
        .bind(&quotation.customer.name)
        .bind(&quotation.customer.email)
        .bind(&quotation.customer.phone)
        .bind(to_json("items_json", &quotation.items)?)
        .bind(quotation.status)
        .bind(quotation.valid_until)
        .bind(to_json("totals_json", &quotation.totals)?)
        .bind(&quotation.notes)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(quotation)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quotation>> {
        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?1");
        let row: Option<QuotationRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Quotation::try_from).transpose()
    }

    /// Gets a quotation by its business number (e.g., "Q-20260301-0004").
    pub async fn get_by_number(&self, quotation_number: &str) -> DbResult<Option<Quotation>> {
        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE quotation_number = ?1");
        let row: Option<QuotationRow> = sqlx::query_as(&sql)
            .bind(quotation_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Quotation::try_from).transpose()
    }

    /// Quotations in `status`, oldest first.
    pub async fn list_by_status(&self, status: QuotationStatus) -> DbResult<Vec<Quotation>> {
        let sql = format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE status = ?1 ORDER BY created_at"
        );
        let rows: Vec<QuotationRow> = sqlx::query_as(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Quotation::try_from).collect()
    }

    /// Records `from → to`, only if the row is still in `from`.
    pub async fn update_status(
        &self,
        id: &str,
        from: QuotationStatus,
        to: QuotationStatus,
    ) -> DbResult<()> {
        debug!(id = %id, from = %from, to = %to, "Updating quotation status");

        let result = sqlx::query(
            "UPDATE quotations SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(id, from).await);
        }
        Ok(())
    }

    /// Expires every open quotation whose validity ended before `today`.
    ///
    /// Returns the numbers of the quotations that were expired. A quotation
    /// that changes status between the scan and its update is skipped.
    pub async fn expire_due(&self, today: NaiveDate) -> DbResult<Vec<String>> {
        let candidates: Vec<(String, String, QuotationStatus)> = sqlx::query_as(
            "SELECT id, quotation_number, status FROM quotations WHERE valid_until < ?1",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let mut expired = Vec::new();
        for (id, number, status) in candidates {
            let Ok(target) = status.transition(QuotationAction::Expire) else {
                continue;
            };
            match self.update_status(&id, status, target).await {
                Ok(()) => expired.push(number),
                Err(DbError::StatusConflict { .. }) => {
                    debug!(quotation_number = %number, "Skipped expiry, status changed")
                }
                Err(e) => return Err(e),
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), today = %today, "Expired quotations");
        }
        Ok(expired)
    }

    async fn missing_or_conflict(&self, id: &str, expected: QuotationStatus) -> DbError {
        match self.get_by_id(id).await {
            Ok(Some(_)) => DbError::StatusConflict {
                entity: "quotation",
                id: id.to_string(),
                expected: expected.to_string(),
            },
            Ok(None) => DbError::not_found("Quotation", id),
            Err(e) => e,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use keystone_core::{calculate_price, Money, PriceAdjustments};

    pub(crate) fn new_quotation(valid_until: NaiveDate) -> NewQuotation {
        let items = vec![
            LineItem::new("Brake pads", 2, Money::from_major(10)),
            LineItem::new("Labour", 1, Money::from_major(45)),
        ];
        let totals = calculate_price(&items, &PriceAdjustments::none()).unwrap();
        NewQuotation {
            customer: Customer::named("Harbour Garage"),
            items,
            totals,
            valid_until,
            notes: Some("Collect before noon".to_string()),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let db = db().await;
        let repo = db.quotations();

        let first = repo.create(new_quotation(day(2030, 1, 1)), "Q").await.unwrap();
        let second = repo.create(new_quotation(day(2030, 1, 1)), "Q").await.unwrap();

        assert_eq!(first.status, QuotationStatus::Draft);
        assert!(first.quotation_number.starts_with("Q-"));
        assert!(first.quotation_number.ends_with("-0001"));
        assert!(second.quotation_number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_round_trip_keeps_items_and_totals() {
        let db = db().await;
        let created = db
            .quotations()
            .create(new_quotation(day(2030, 1, 1)), "Q")
            .await
            .unwrap();

        let loaded = db
            .quotations()
            .get_by_number(&created.quotation_number)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.items, created.items);
        assert_eq!(loaded.totals, created.totals);
        assert_eq!(loaded.totals.grand_total, Money::from_major(65));
        assert_eq!(loaded.valid_until, day(2030, 1, 1));
        assert_eq!(loaded.customer.name, "Harbour Garage");
    }

    #[tokio::test]
    async fn test_update_status_is_guarded() {
        let db = db().await;
        let repo = db.quotations();
        let q = repo.create(new_quotation(day(2030, 1, 1)), "Q").await.unwrap();

        repo.update_status(&q.id, QuotationStatus::Draft, QuotationStatus::Sent)
            .await
            .unwrap();

        // Second writer still believes the quotation is a draft.
        let err = repo
            .update_status(&q.id, QuotationStatus::Draft, QuotationStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { .. }));

        let err = repo
            .update_status("missing", QuotationStatus::Draft, QuotationStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let sent = repo.list_by_status(QuotationStatus::Sent).await.unwrap();
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn test_expire_due_skips_terminal_and_current() {
        let db = db().await;
        let repo = db.quotations();

        let stale = repo.create(new_quotation(day(2020, 1, 1)), "Q").await.unwrap();
        let rejected = repo.create(new_quotation(day(2020, 1, 1)), "Q").await.unwrap();
        let current = repo.create(new_quotation(day(2030, 1, 1)), "Q").await.unwrap();

        repo.update_status(&rejected.id, QuotationStatus::Draft, QuotationStatus::Sent)
            .await
            .unwrap();
        repo.update_status(&rejected.id, QuotationStatus::Sent, QuotationStatus::Rejected)
            .await
            .unwrap();

        let expired = repo.expire_due(day(2025, 6, 1)).await.unwrap();
        assert_eq!(expired, vec![stale.quotation_number.clone()]);

        let reloaded = repo.get_by_id(&stale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, QuotationStatus::Expired);
        let reloaded = repo.get_by_id(&current.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, QuotationStatus::Draft);

        // Valid through the last day itself.
        assert!(repo.expire_due(day(2030, 1, 1)).await.unwrap().is_empty());
    }
}
