//! # Order Commands
//!
//! ## Conversion Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  convert_quotation_to_order("Q-20260301-0004")                          │
//! │                                                                         │
//! │  1. status.transition(Convert)     accepted only, else INVALID_TRANSITION│
//! │  2. check_availability (fresh)     any unavailable → INSUFFICIENT_STOCK │
//! │  3. one transaction:                                                    │
//! │       UPDATE quotations ... WHERE status = 'accepted'                  │
//! │       INSERT INTO orders ...                                            │
//! │     lost race → CONFLICT, nothing written                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is read again at conversion time but not reserved. Two accepted
//! quotations can both pass step 2 for the last units on the shelf.

use keystone_core::validation::validate_name;
use keystone_core::{CoreError, Order, OrderAction, PaymentStatus, QuotationAction};
use tracing::{debug, info};

use crate::commands::inventory::inventory_check_for;
use crate::commands::quotation::load_quotation;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn load_order(state: &AppState, number: &str) -> ApiResult<Order> {
    state
        .db
        .orders()
        .get_by_number(number)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", number))
}

/// Converts an accepted quotation whose lines are all in stock.
///
/// The new order starts pending, unpaid and unfulfilled, with
/// `orders.default_warehouse` pre-assigned when configured.
pub async fn convert_quotation_to_order(state: &AppState, number: &str) -> ApiResult<Order> {
    debug!(quotation_number = %number, "convert_quotation_to_order command");

    let quotation = load_quotation(state, number).await?;
    quotation.status.transition(QuotationAction::Convert)?;

    let check = inventory_check_for(state, &quotation).await?;
    check.require_fulfillable()?;

    let order = state
        .db
        .orders()
        .convert_quotation(
            &quotation,
            &state.config.orders.number_prefix,
            state.config.orders.default_warehouse.as_deref(),
        )
        .await?;

    info!(
        quotation_number = %number,
        order_number = %order.order_number,
        lines = order.items.len(),
        "Order created from quotation"
    );

    Ok(order)
}

/// Applies `action` to an order.
///
/// Fulfilment follows the order status: processing starts picking,
/// shipping marks it packed, delivery marks it fulfilled.
pub async fn transition_order(
    state: &AppState,
    number: &str,
    action: OrderAction,
) -> ApiResult<Order> {
    debug!(order_number = %number, action = ?action, "transition_order command");

    let order = load_order(state, number).await?;
    let target = order
        .status
        .transition(action, &order.order_number, order.warehouse.as_deref())?;

    state
        .db
        .orders()
        .update_status(&order.id, order.status, target, target.implied_fulfillment())
        .await?;

    info!(
        order_number = %number,
        from = %order.status,
        to = %target,
        "Order status changed"
    );

    load_order(state, number).await
}

/// Assigns the warehouse an order ships from.
///
/// Allowed until the order has shipped. A status change that lands between
/// the check here and the write is reported as `CONFLICT`.
pub async fn assign_order_warehouse(
    state: &AppState,
    number: &str,
    warehouse: &str,
) -> ApiResult<Order> {
    debug!(order_number = %number, warehouse = %warehouse, "assign_order_warehouse command");

    validate_name("warehouse", warehouse).map_err(CoreError::from)?;

    let order = load_order(state, number).await?;
    if !order.status.allows_warehouse_change() {
        return Err(ApiError::business(format!(
            "Order {} is {} and can no longer change warehouse",
            order.order_number, order.status
        )));
    }

    state
        .db
        .orders()
        .assign_warehouse(&order.id, warehouse.trim())
        .await?;

    info!(order_number = %number, warehouse = %warehouse.trim(), "Warehouse assigned");

    load_order(state, number).await
}

/// Records the payment status reported by billing.
pub async fn update_order_payment_status(
    state: &AppState,
    number: &str,
    status: PaymentStatus,
) -> ApiResult<Order> {
    debug!(order_number = %number, payment_status = ?status, "update_order_payment_status command");

    let order = load_order(state, number).await?;
    state.db.orders().update_payment_status(&order.id, status).await?;

    load_order(state, number).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::inventory::tests::{product, quotation_for};
    use crate::commands::quotation::tests::day;
    use crate::commands::quotation::transition_quotation;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use crate::state::tests::memory_state;
    use keystone_core::{FulfillmentStatus, OrderStatus, QuotationStatus};

    async fn accept(state: &AppState, number: &str) {
        for action in [QuotationAction::Send, QuotationAction::Accept] {
            transition_quotation(state, number, action, day(2026, 3, 2))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_convert_accepted_quotation() {
        let mut config = AppConfig::default();
        config.orders.default_warehouse = Some("Main".into());
        let state = memory_state(config).await;

        let part = product("BRK-PAD-01", 10, 2, None);
        let number = quotation_for(&state, &[(&part, 4)]).await;
        accept(&state, &number).await;

        let order = convert_quotation_to_order(&state, &number).await.unwrap();

        assert!(order.order_number.starts_with("SO-"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Unfulfilled);
        assert_eq!(order.warehouse.as_deref(), Some("Main"));
        assert_eq!(order.items.len(), 2);

        let quotation = load_quotation(&state, &number).await.unwrap();
        assert_eq!(quotation.status, QuotationStatus::Converted);
        assert_eq!(order.quotation_id.as_deref(), Some(quotation.id.as_str()));
    }

    #[tokio::test]
    async fn test_draft_cannot_convert() {
        let state = memory_state(AppConfig::default()).await;
        let part = product("BRK-PAD-01", 10, 2, None);
        let number = quotation_for(&state, &[(&part, 1)]).await;

        let err = convert_quotation_to_order(&state, &number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(err.message, "Cannot move quotation from draft to converted");
    }

    #[tokio::test]
    async fn test_conversion_blocked_by_stock() {
        let state = memory_state(AppConfig::default()).await;
        let part = product("BAT-12V-70", 5, 1, None);
        let number = quotation_for(&state, &[(&part, 3)]).await;
        accept(&state, &number).await;

        // Stock sold elsewhere after acceptance.
        state.db.products().adjust_stock(&part.id, -4).await.unwrap();

        let err = convert_quotation_to_order(&state, &number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let quotation = load_quotation(&state, &number).await.unwrap();
        assert_eq!(quotation.status, QuotationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_second_conversion_rejected() {
        let state = memory_state(AppConfig::default()).await;
        let part = product("OIL-FLT-01", 10, 2, None);
        let number = quotation_for(&state, &[(&part, 1)]).await;
        accept(&state, &number).await;

        convert_quotation_to_order(&state, &number).await.unwrap();
        let err = convert_quotation_to_order(&state, &number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let state = memory_state(AppConfig::default()).await;
        let part = product("BLT-SRP-01", 10, 2, None);
        let number = quotation_for(&state, &[(&part, 1)]).await;
        accept(&state, &number).await;
        let order = convert_quotation_to_order(&state, &number).await.unwrap();
        let so = order.order_number.as_str();

        transition_order(&state, so, OrderAction::Confirm).await.unwrap();

        let err = transition_order(&state, so, OrderAction::StartProcessing)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        assign_order_warehouse(&state, so, " North ").await.unwrap();
        let order = transition_order(&state, so, OrderAction::StartProcessing)
            .await
            .unwrap();
        assert_eq!(order.warehouse.as_deref(), Some("North"));
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Picking);

        let order = transition_order(&state, so, OrderAction::Ship).await.unwrap();
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Packed);

        let err = assign_order_warehouse(&state, so, "South").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let order = transition_order(&state, so, OrderAction::Deliver).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);

        let err = transition_order(&state, so, OrderAction::Cancel).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_payment_status_and_blank_warehouse() {
        let state = memory_state(AppConfig::default()).await;
        let part = product("HYD-HOS-08", 30, 5, None);
        let number = quotation_for(&state, &[(&part, 12)]).await;
        accept(&state, &number).await;
        let order = convert_quotation_to_order(&state, &number).await.unwrap();

        let order = update_order_payment_status(&state, &order.order_number, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        let err = assign_order_warehouse(&state, &order.order_number, "   ")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
