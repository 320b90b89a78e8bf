//! # Pricing Commands
//!
//! Prices a basket for display while staff build a quotation. Nothing is
//! stored; totals are recomputed on every call.

use keystone_core::{calculate_price, LineItem, PriceAdjustments, PriceCalculation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItemsRequest {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub adjustments: PriceAdjustments,
}

/// Exact totals plus a copy rounded to cents for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItemsResponse {
    pub exact: PriceCalculation,
    pub display: PriceCalculation,
}

/// Prices line items with the order-level adjustments.
///
/// Invalid lines come back as a `VALIDATION_ERROR` listing every bad field.
pub fn price_items(request: &PriceItemsRequest) -> ApiResult<PriceItemsResponse> {
    debug!(
        lines = request.items.len(),
        discounts = request.adjustments.discounts.len(),
        taxes = request.adjustments.taxes.len(),
        "price_items command"
    );

    let exact = calculate_price(&request.items, &request.adjustments)?;
    let display = exact.rounded();

    Ok(PriceItemsResponse { exact, display })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use keystone_core::pricing::Shipping;
    use keystone_core::{Money, Percent};

    #[test]
    fn test_prices_basket() {
        let request = PriceItemsRequest {
            items: vec![LineItem::new("Brake pads", 2, Money::from_major(10))
                .with_discount(Percent::from_whole(10))
                .with_tax(Percent::from_whole(5))],
            adjustments: PriceAdjustments::with_shipping(Shipping::flat(Money::from_major(4))),
        };

        let response = price_items(&request).unwrap();
        assert_eq!(response.exact.subtotal, Money::from_major(20));
        assert_eq!(response.exact.total_discount, Money::from_major(2));
        assert_eq!(response.exact.total_tax, Money::from_cents(90));
        assert_eq!(response.exact.grand_total, Money::from_cents(2290));
        assert_eq!(response.display.grand_total.to_string(), "$22.90");
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let request = PriceItemsRequest {
            items: vec![LineItem::new("Oil filter", -1, Money::from_cents(899))],
            adjustments: PriceAdjustments::none(),
        };

        let err = price_items(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.errors.is_some());
    }

    #[test]
    fn test_request_deserializes_without_adjustments() {
        let request: PriceItemsRequest = serde_json::from_str(
            r#"{ "items": [{ "name": "Labour", "quantity": 1, "unitPrice": "85.00" }] }"#,
        )
        .unwrap();

        let response = price_items(&request).unwrap();
        assert_eq!(response.exact.grand_total, Money::from_major(85));
    }
}
