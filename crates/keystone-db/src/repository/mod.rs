//! # Repository Module
//!
//! Database repositories for Keystone Workshop.
//!
//! ```text
//! Command (keystone-app)
//!      │  db.quotations().get_by_number("Q-20260301-0004")
//!      ▼
//! QuotationRepository ──► SQL ──► SQLite
//!      │
//!      ▼
//! keystone_core::Quotation (row decoded, JSON columns parsed)
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products, stock and bin snapshots
//! - [`QuotationRepository`](quotation::QuotationRepository) - Quotations and guarded status updates
//! - [`OrderRepository`](order::OrderRepository) - Orders, conversion from quotations
//!
//! ## Storage Conventions
//! - Money / percentages: decimal TEXT, parsed back with [`parse_decimal`]
//! - Line items and totals: JSON TEXT via [`to_json`] / [`from_json`]
//! - Status enums: snake_case TEXT through the `sqlx::Type` derives in keystone-core

pub mod order;
pub mod product;
pub mod quotation;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a decimal TEXT column.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::decode(column, e))
}

/// Encodes a value for a JSON TEXT column.
pub(crate) fn to_json<T: Serialize>(column: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::decode(column, e))
}

/// Decodes a JSON TEXT column.
pub(crate) fn from_json<T: DeserializeOwned>(column: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::decode(column, e))
}

/// Formats a document number: `PREFIX-YYYYMMDD-NNNN`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use keystone_db::repository::format_document_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// assert_eq!(format_document_number("Q", date, 4), "Q-20260301-0004");
/// assert_eq!(format_document_number("SO", date, 12345), "SO-20260301-12345");
/// ```
pub fn format_document_number(prefix: &str, date: NaiveDate, sequence: u32) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y%m%d"), sequence)
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Next daily sequence number for `table.column` under `prefix` and `date`.
///
/// Reads the highest existing suffix for the day. Two writers racing on the
/// same day can pick the same number; the UNIQUE index rejects the loser.
/// A stored suffix beyond `u32` is reported as a decode error.
pub(crate) async fn next_document_number(
    pool: &SqlitePool,
    table: &'static str,
    column: &'static str,
    prefix: &str,
    date: NaiveDate,
) -> DbResult<String> {
    let day_prefix = format!("{}-{}-", prefix, date.format("%Y%m%d"));

    // table/column are compile-time constants, never user input
    let sql = format!(
        "SELECT MAX(CAST(substr({column}, ?1) AS INTEGER)) FROM {table} \
         WHERE {column} LIKE ?2 ESCAPE '\\'"
    );

    // substr() counts characters, not bytes
    let max: Option<i64> = sqlx::query_scalar(&sql)
        .bind(day_prefix.chars().count() as i64 + 1)
        .bind(format!("{}%", escape_like(&day_prefix)))
        .fetch_one(pool)
        .await?;

    let last = u32::try_from(max.unwrap_or(0).max(0)).map_err(|_| {
        DbError::decode(column, format!("sequence suffix out of range in {}", table))
    })?;
    let next = last
        .checked_add(1)
        .ok_or_else(|| DbError::decode(column, format!("daily sequence exhausted in {}", table)))?;

    Ok(format_document_number(prefix, date, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("unit_price", "12.50").unwrap(), Decimal::new(1250, 2));
        let err = parse_decimal("unit_price", "twelve").unwrap_err();
        assert!(err.to_string().starts_with("Corrupt unit_price value"));
    }

    #[test]
    fn test_document_number_padding() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(format_document_number("SO", date, 1), "SO-20261231-0001");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Q_1-20260301-"), "Q\\_1-20260301-");
        assert_eq!(escape_like("50%\\"), "50\\%\\\\");
        assert_eq!(escape_like("SO-"), "SO-");
    }

    async fn docs_table(numbers: &[&str]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("CREATE TABLE docs (number TEXT NOT NULL UNIQUE)")
            .execute(db.pool())
            .await
            .unwrap();
        for number in numbers {
            sqlx::query("INSERT INTO docs (number) VALUES (?1)")
                .bind(*number)
                .execute(db.pool())
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_wildcards_in_prefix_match_literally() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        // "A_" must not match "AB", and "A%" must not match "AXYZ"
        let db = docs_table(&["AB-20260301-0007", "AXYZ-20260301-0009", "A_-20260301-0002"]).await;

        let next = next_document_number(db.pool(), "docs", "number", "A_", date)
            .await
            .unwrap();
        assert_eq!(next, "A_-20260301-0003");

        let next = next_document_number(db.pool(), "docs", "number", "A%", date)
            .await
            .unwrap();
        assert_eq!(next, "A%-20260301-0001");
    }

    #[tokio::test]
    async fn test_oversized_suffix_is_decode_error() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let db = docs_table(&["Q-20260301-99999999999", "SO-20260301-4294967295"]).await;

        let err = next_document_number(db.pool(), "docs", "number", "Q", date)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Decode { .. }));

        let err = next_document_number(db.pool(), "docs", "number", "SO", date)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("daily sequence exhausted"));
    }
}
