//! # Quotation Commands
//!
//! ## Lifecycle Handled Here
//! ```text
//! create_quotation ──► draft
//!                        │ transition_quotation(send / view / accept / reject)
//!                        ▼
//!                  sent / viewed / accepted / rejected
//!
//! expire_quotations ──► every open quotation past valid_until → expired
//! ```
//!
//! Conversion to an order lives in `order.rs`, because it also needs the
//! inventory check.

use chrono::{Duration, NaiveDate, Utc};
use keystone_core::validation::validate_quotation_draft;
use keystone_core::{
    calculate_price, CoreError, Customer, LineItem, PriceAdjustments, Quotation, QuotationAction,
};
use keystone_db::NewQuotation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationRequest {
    pub customer: Customer,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub adjustments: PriceAdjustments,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Loads a quotation by its number.
pub(crate) async fn load_quotation(state: &AppState, number: &str) -> ApiResult<Quotation> {
    state
        .db
        .quotations()
        .get_by_number(number)
        .await?
        .ok_or_else(|| ApiError::not_found("Quotation", number))
}

/// Prices and stores a new draft quotation.
///
/// Validity runs `quotations.validity_days` from `today`.
pub async fn create_quotation(
    state: &AppState,
    request: CreateQuotationRequest,
    today: NaiveDate,
) -> ApiResult<Quotation> {
    debug!(customer = %request.customer.name, lines = request.items.len(), "create_quotation command");

    validate_quotation_draft(&request.customer, &request.items)
        .map_err(CoreError::from)?;
    let totals = calculate_price(&request.items, &request.adjustments)?;

    let valid_until = today + Duration::days(i64::from(state.config.quotations.validity_days));

    let quotation = state
        .db
        .quotations()
        .create(
            NewQuotation {
                customer: request.customer,
                items: request.items,
                totals,
                valid_until,
                notes: request.notes,
            },
            &state.config.quotations.number_prefix,
        )
        .await?;

    info!(
        quotation_number = %quotation.quotation_number,
        grand_total = %quotation.totals.grand_total,
        valid_until = %quotation.valid_until,
        "Quotation created"
    );

    Ok(quotation)
}

/// Applies `action` to a quotation and records the new status.
///
/// ## Errors
/// * `INVALID_TRANSITION` - the workflow does not allow the move
/// * `BUSINESS_LOGIC` - converting (use `convert_quotation_to_order`), or
///   accepting after the validity date
/// * `CONFLICT` - someone else moved the quotation first
pub async fn transition_quotation(
    state: &AppState,
    number: &str,
    action: QuotationAction,
    today: NaiveDate,
) -> ApiResult<Quotation> {
    debug!(quotation_number = %number, action = ?action, "transition_quotation command");

    if action == QuotationAction::Convert {
        return Err(ApiError::business(
            "Quotations are converted with convert_quotation_to_order",
        ));
    }

    let quotation = load_quotation(state, number).await?;

    if action == QuotationAction::Accept && quotation.is_past_validity(today) {
        return Err(ApiError::business(format!(
            "Quotation {} expired on {}",
            quotation.quotation_number, quotation.valid_until
        )));
    }

    let target = quotation.status.transition(action)?;
    state
        .db
        .quotations()
        .update_status(&quotation.id, quotation.status, target)
        .await?;

    info!(
        quotation_number = %quotation.quotation_number,
        from = %quotation.status,
        to = %target,
        "Quotation status changed"
    );

    load_quotation(state, number).await
}

/// Expires every open quotation whose validity ended before `today`.
///
/// Returns the expired quotation numbers.
pub async fn expire_quotations(state: &AppState, today: NaiveDate) -> ApiResult<Vec<String>> {
    debug!(today = %today, "expire_quotations command");
    Ok(state.db.quotations().expire_due(today).await?)
}

/// Today's date for commands that need one.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use crate::state::tests::memory_state;
    use keystone_core::{Money, Percent, QuotationStatus};

    pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn request(items: Vec<LineItem>) -> CreateQuotationRequest {
        CreateQuotationRequest {
            customer: Customer::named("Harbour Garage"),
            items,
            adjustments: PriceAdjustments::none(),
            notes: None,
        }
    }

    fn labour() -> Vec<LineItem> {
        vec![LineItem::new("Labour, per hour", 2, Money::from_major(80))
            .with_tax(Percent::from_whole(10))]
    }

    #[tokio::test]
    async fn test_create_quotation() {
        let state = memory_state(AppConfig::default()).await;

        let quotation = create_quotation(&state, request(labour()), day(2026, 3, 1))
            .await
            .unwrap();

        assert_eq!(quotation.status, QuotationStatus::Draft);
        // Numbered by creation date, not by the validity start.
        assert!(quotation.quotation_number.starts_with("Q-"));
        assert!(quotation.quotation_number.ends_with("-0001"));
        assert_eq!(quotation.valid_until, day(2026, 3, 31));
        assert_eq!(quotation.totals.grand_total, Money::from_major(176));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_quotation() {
        let state = memory_state(AppConfig::default()).await;

        let mut req = request(vec![]);
        req.customer.name = String::new();
        let err = create_quotation(&state, req, day(2026, 3, 1)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        let paths: Vec<String> = err.errors.unwrap().into_iter().map(|e| e.path).collect();
        assert!(paths.contains(&"items".to_string()));
        assert!(paths.contains(&"customer.name".to_string()));
    }

    #[tokio::test]
    async fn test_send_view_accept() {
        let state = memory_state(AppConfig::default()).await;
        let today = day(2026, 3, 1);
        let q = create_quotation(&state, request(labour()), today).await.unwrap();

        let q = transition_quotation(&state, &q.quotation_number, QuotationAction::Send, today)
            .await
            .unwrap();
        assert_eq!(q.status, QuotationStatus::Sent);

        let q = transition_quotation(&state, &q.quotation_number, QuotationAction::View, today)
            .await
            .unwrap();
        let q = transition_quotation(&state, &q.quotation_number, QuotationAction::Accept, today)
            .await
            .unwrap();
        assert_eq!(q.status, QuotationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let state = memory_state(AppConfig::default()).await;
        let today = day(2026, 3, 1);
        let q = create_quotation(&state, request(labour()), today).await.unwrap();

        let err = transition_quotation(&state, &q.quotation_number, QuotationAction::Accept, today)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let err = transition_quotation(&state, &q.quotation_number, QuotationAction::Convert, today)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_cannot_accept_after_validity() {
        let state = memory_state(AppConfig::default()).await;
        let q = create_quotation(&state, request(labour()), day(2026, 3, 1)).await.unwrap();
        transition_quotation(&state, &q.quotation_number, QuotationAction::Send, day(2026, 3, 2))
            .await
            .unwrap();

        let err = transition_quotation(
            &state,
            &q.quotation_number,
            QuotationAction::Accept,
            day(2026, 4, 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_expire_quotations() {
        let state = memory_state(AppConfig::default()).await;
        let q = create_quotation(&state, request(labour()), day(2026, 3, 1)).await.unwrap();

        assert!(expire_quotations(&state, day(2026, 3, 31)).await.unwrap().is_empty());

        let expired = expire_quotations(&state, day(2026, 4, 1)).await.unwrap();
        assert_eq!(expired, vec![q.quotation_number.clone()]);

        let q = load_quotation(&state, &q.quotation_number).await.unwrap();
        assert_eq!(q.status, QuotationStatus::Expired);
    }

    #[tokio::test]
    async fn test_unknown_quotation() {
        let state = memory_state(AppConfig::default()).await;
        let err = transition_quotation(&state, "Q-19990101-0001", QuotationAction::Send, day(2026, 3, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
