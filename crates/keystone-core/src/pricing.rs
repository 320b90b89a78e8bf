//! # Pricing Engine
//!
//! Computes quotation, order and purchase-order totals from line items.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Per Line Item                                    │
//! │                                                                         │
//! │  line_subtotal = quantity × unit_price                                 │
//! │  line_discount = line_subtotal × discount% / 100                       │
//! │  line_taxable  = line_subtotal − line_discount                         │
//! │  line_tax      = line_taxable × tax% / 100                             │
//! │  line_total    = line_taxable + line_tax                               │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                        Order Level                                      │
//! │                                                                         │
//! │  base = Σ line_taxable                                                 │
//! │    │                                                                    │
//! │    ├── order discounts (in order, each capped at remaining base)       │
//! │    │       └── added to total_discount                                 │
//! │    │                                                                    │
//! │    └── order taxes on the discounted base                              │
//! │            └── added to total_tax                                      │
//! │                                                                         │
//! │  shipping_cost = shipping.cost + shipping.handling_fee                 │
//! │                                                                         │
//! │  grand_total = subtotal − total_discount + total_tax + shipping_cost   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: the same input always produces the same
//! [`PriceCalculation`]. Amounts are left unrounded; call
//! [`PriceCalculation::rounded`] (or format with `Display`) when presenting.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError, ValidationErrors};
use crate::money::{Money, Percent};
use crate::types::LineItem;
use crate::validation::{validate_line_items, validate_money_amount};
use crate::MAX_MONEY_AMOUNT;

// =============================================================================
// Adjustments
// =============================================================================

/// How an order-level adjustment is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Percentage of the running base.
    Percentage(Percent),
    /// Flat amount.
    Fixed(Money),
}

/// An order-level discount or tax (e.g. "Loyalty 5%", "Environmental levy").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub label: String,
    pub kind: AdjustmentKind,
}

impl Adjustment {
    pub fn percentage(label: impl Into<String>, pct: Percent) -> Self {
        Adjustment {
            label: label.into(),
            kind: AdjustmentKind::Percentage(pct),
        }
    }

    pub fn fixed(label: impl Into<String>, amount: Money) -> Self {
        Adjustment {
            label: label.into(),
            kind: AdjustmentKind::Fixed(amount),
        }
    }

    /// Amount this adjustment contributes against `base`.
    fn amount_on(&self, base: Money) -> Money {
        match self.kind {
            AdjustmentKind::Percentage(pct) => base.percent_of(pct),
            AdjustmentKind::Fixed(amount) => amount,
        }
    }
}

/// Shipping and handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shipping {
    #[serde(default)]
    pub cost: Money,
    #[serde(default)]
    pub handling_fee: Money,
}

impl Shipping {
    pub fn flat(cost: Money) -> Self {
        Shipping {
            cost,
            handling_fee: Money::zero(),
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.cost + self.handling_fee
    }
}

/// Everything besides line items that affects the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceAdjustments {
    #[serde(default)]
    pub discounts: Vec<Adjustment>,
    #[serde(default)]
    pub taxes: Vec<Adjustment>,
    #[serde(default)]
    pub shipping: Shipping,
}

impl PriceAdjustments {
    /// No order-level discounts, taxes or shipping.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_shipping(shipping: Shipping) -> Self {
        PriceAdjustments {
            shipping,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let groups = [("discounts", &self.discounts), ("taxes", &self.taxes)];
        for (group, adjustments) in groups {
            for (i, adj) in adjustments.iter().enumerate() {
                let prefix = format!("{}[{}]", group, i);
                match adj.kind {
                    AdjustmentKind::Percentage(pct) => errors.check(&prefix, pct.validate("value")),
                    AdjustmentKind::Fixed(amount) => {
                        errors.check(&prefix, validate_money_amount("value", amount))
                    }
                }
            }
        }

        errors.check(
            "shipping",
            validate_money_amount("cost", self.shipping.cost),
        );
        errors.check(
            "shipping",
            validate_money_amount("handlingFee", self.shipping.handling_fee),
        );

        errors.into_result()
    }
}

// =============================================================================
// Results
// =============================================================================

/// Computed amounts for one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub name: String,
    pub product_id: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_subtotal: Money,
    pub line_discount: Money,
    pub line_taxable: Money,
    pub line_tax: Money,
    pub line_total: Money,
}

impl LineBreakdown {
    /// Prices a single line.
    ///
    /// Returns `None` when an amount leaves the `Decimal` range, which
    /// validated items never do.
    pub fn for_item(item: &LineItem) -> Option<Self> {
        let line_subtotal = item.unit_price.checked_multiply_quantity(item.quantity)?;
        let line_discount = line_subtotal.checked_percent_of(item.discount())?;
        let line_taxable = line_subtotal.checked_sub(line_discount)?;
        let line_tax = line_taxable.checked_percent_of(item.tax_rate())?;
        let line_total = line_taxable.checked_add(line_tax)?;

        Some(LineBreakdown {
            name: item.name.clone(),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_subtotal,
            line_discount,
            line_taxable,
            line_tax,
            line_total,
        })
    }

    fn rounded(&self) -> Self {
        LineBreakdown {
            unit_price: self.unit_price.rounded(),
            line_subtotal: self.line_subtotal.rounded(),
            line_discount: self.line_discount.rounded(),
            line_taxable: self.line_taxable.rounded(),
            line_tax: self.line_tax.rounded(),
            line_total: self.line_total.rounded(),
            ..self.clone()
        }
    }
}

/// Totals for a set of line items.
///
/// ## Invariant
/// `grand_total == subtotal - total_discount + total_tax + shipping_cost`
/// holds exactly on the unrounded values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculation {
    pub subtotal: Money,
    pub total_discount: Money,
    pub total_tax: Money,
    pub shipping_cost: Money,
    pub grand_total: Money,
    pub per_item_breakdown: Vec<LineBreakdown>,
}

impl PriceCalculation {
    /// Copy with every amount rounded to cents, for display.
    ///
    /// The rounded copy is for presentation only: its fields are rounded
    /// independently, so the grand-total identity may be off by a cent.
    pub fn rounded(&self) -> Self {
        PriceCalculation {
            subtotal: self.subtotal.rounded(),
            total_discount: self.total_discount.rounded(),
            total_tax: self.total_tax.rounded(),
            shipping_cost: self.shipping_cost.rounded(),
            grand_total: self.grand_total.rounded(),
            per_item_breakdown: self
                .per_item_breakdown
                .iter()
                .map(LineBreakdown::rounded)
                .collect(),
        }
    }

    /// Amount after all discounts, before tax and shipping.
    pub fn net_amount(&self) -> Money {
        self.subtotal - self.total_discount
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Prices `items` with the given order-level adjustments.
///
/// ## Errors
/// `CoreError::Validation` listing every bad field (negative quantity or
/// price, percentages outside 0–100, negative shipping, amounts above
/// [`MAX_MONEY_AMOUNT`](crate::MAX_MONEY_AMOUNT)). Nothing is computed for an
/// invalid payload.
///
/// ## Example
/// ```rust
/// use keystone_core::money::{Money, Percent};
/// use keystone_core::pricing::{calculate_price, PriceAdjustments};
/// use keystone_core::types::LineItem;
///
/// let items = vec![LineItem::new("Brake pads", 2, Money::from_major(10))
///     .with_discount(Percent::from_whole(10))
///     .with_tax(Percent::from_whole(5))];
///
/// let calc = calculate_price(&items, &PriceAdjustments::none()).unwrap();
/// assert_eq!(calc.subtotal.to_string(), "$20.00");
/// assert_eq!(calc.total_discount.to_string(), "$2.00");
/// assert_eq!(calc.total_tax.to_string(), "$0.90");
/// assert_eq!(calc.grand_total.to_string(), "$18.90");
/// ```
pub fn calculate_price(
    items: &[LineItem],
    adjustments: &PriceAdjustments,
) -> CoreResult<PriceCalculation> {
    let mut errors = match validate_line_items(items) {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if let Err(adj_errors) = adjustments.validate() {
        errors.errors.extend(adj_errors.errors);
    }
    errors.into_result()?;

    price_validated(items, adjustments)
}

/// Prices line items without order-level adjustments.
pub fn calculate_line_totals(items: &[LineItem]) -> CoreResult<PriceCalculation> {
    calculate_price(items, &PriceAdjustments::none())
}

/// The arithmetic, assuming validated input.
///
/// Validation bounds every amount, so only the line pricing is checked.
fn price_validated(
    items: &[LineItem],
    adjustments: &PriceAdjustments,
) -> CoreResult<PriceCalculation> {
    let per_item_breakdown = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            LineBreakdown::for_item(item).ok_or_else(|| {
                let err = ValidationError::OutOfRange {
                    field: "unitPrice".to_string(),
                    min: "0".to_string(),
                    max: MAX_MONEY_AMOUNT.to_string(),
                };
                CoreError::Validation(ValidationErrors::single(&format!("items[{}]", i), err))
            })
        })
        .collect::<CoreResult<Vec<LineBreakdown>>>()?;

    let subtotal: Money = per_item_breakdown.iter().map(|l| l.line_subtotal).sum();
    let mut total_discount: Money = per_item_breakdown.iter().map(|l| l.line_discount).sum();
    let mut total_tax: Money = per_item_breakdown.iter().map(|l| l.line_tax).sum();

    // Order discounts never push the base below zero.
    let mut base = subtotal - total_discount;
    for discount in &adjustments.discounts {
        let amount = discount.amount_on(base).min(base).non_negative();
        total_discount += amount;
        base -= amount;
    }

    for tax in &adjustments.taxes {
        total_tax += tax.amount_on(base);
    }

    let shipping_cost = adjustments.shipping.total();
    let grand_total = subtotal - total_discount + total_tax + shipping_cost;

    Ok(PriceCalculation {
        subtotal,
        total_discount,
        total_tax,
        shipping_cost,
        grand_total,
        per_item_breakdown,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn brake_pads() -> LineItem {
        LineItem::new("Brake pads", 2, Money::from_major(10))
            .with_discount(Percent::from_whole(10))
            .with_tax(Percent::from_whole(5))
    }

    #[test]
    fn test_single_line_scenario() {
        let calc = calculate_line_totals(&[brake_pads()]).unwrap();
        let line = &calc.per_item_breakdown[0];

        assert_eq!(line.line_subtotal.amount(), dec!(20));
        assert_eq!(line.line_discount.amount(), dec!(2));
        assert_eq!(line.line_taxable.amount(), dec!(18));
        assert_eq!(line.line_tax.amount(), dec!(0.9));
        assert_eq!(line.line_total.amount(), dec!(18.9));
        assert_eq!(calc.grand_total.amount(), dec!(18.9));
        assert!(calc.shipping_cost.is_zero());
    }

    #[test]
    fn test_empty_items_price_to_zero() {
        let calc = calculate_line_totals(&[]).unwrap();
        assert_eq!(calc, PriceCalculation::default());
        assert!(calc.grand_total.is_zero());
        assert!(calc.per_item_breakdown.is_empty());
    }

    #[test]
    fn test_missing_percentages_mean_zero() {
        let item = LineItem::new("Labour", 3, Money::new(dec!(45.50)));
        let calc = calculate_line_totals(&[item]).unwrap();
        assert_eq!(calc.subtotal.amount(), dec!(136.50));
        assert!(calc.total_discount.is_zero());
        assert!(calc.total_tax.is_zero());
        assert_eq!(calc.grand_total, calc.subtotal);
    }

    #[test]
    fn test_shipping_and_handling_add_to_total() {
        let shipping = Shipping {
            cost: Money::new(dec!(12.50)),
            handling_fee: Money::new(dec!(2.50)),
        };
        let calc =
            calculate_price(&[brake_pads()], &PriceAdjustments::with_shipping(shipping)).unwrap();
        assert_eq!(calc.shipping_cost.amount(), dec!(15));
        assert_eq!(calc.grand_total.amount(), dec!(33.9));
    }

    #[test]
    fn test_order_discount_then_order_tax() {
        let item = LineItem::new("Pump", 1, Money::from_major(200));
        let adjustments = PriceAdjustments {
            discounts: vec![
                Adjustment::percentage("Trade", Percent::from_whole(10)),
                Adjustment::fixed("Voucher", Money::from_major(30)),
            ],
            taxes: vec![Adjustment::percentage("VAT", Percent::from_whole(20))],
            shipping: Shipping::default(),
        };
        let calc = calculate_price(&[item], &adjustments).unwrap();

        // 200 - 20 (10%) - 30 = 150, VAT 20% of 150 = 30
        assert_eq!(calc.total_discount.amount(), dec!(50));
        assert_eq!(calc.total_tax.amount(), dec!(30));
        assert_eq!(calc.grand_total.amount(), dec!(180));
        assert_eq!(calc.net_amount().amount(), dec!(150));
    }

    #[test]
    fn test_fixed_discount_is_capped_at_base() {
        let item = LineItem::new("Washer", 1, Money::from_major(5));
        let adjustments = PriceAdjustments {
            discounts: vec![Adjustment::fixed("Goodwill", Money::from_major(50))],
            ..PriceAdjustments::none()
        };
        let calc = calculate_price(&[item], &adjustments).unwrap();
        assert_eq!(calc.total_discount.amount(), dec!(5));
        assert!(calc.grand_total.is_zero());
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        let items = vec![
            LineItem::new("Bad qty", -1, Money::from_major(1)),
            LineItem::new("Bad price", 1, Money::from_major(-1)),
        ];
        let adjustments = PriceAdjustments::with_shipping(Shipping::flat(Money::from_major(-5)));

        match calculate_price(&items, &adjustments) {
            Err(CoreError::Validation(errors)) => {
                let paths: Vec<&str> = errors.errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec!["items[0].quantity", "items[1].unitPrice", "shipping.cost"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_amounts_are_validation_errors() {
        let items = vec![LineItem::new(
            "Typo",
            100_000,
            Money::new(Decimal::from_i128_with_scale(10i128.pow(25), 0)),
        )];
        let adjustments = PriceAdjustments {
            discounts: vec![Adjustment::fixed("Goodwill", Money::new(Decimal::MAX))],
            taxes: vec![],
            shipping: Shipping {
                cost: Money::from_major(MAX_MONEY_AMOUNT + 1),
                handling_fee: Money::from_major(MAX_MONEY_AMOUNT),
            },
        };

        match calculate_price(&items, &adjustments) {
            Err(CoreError::Validation(errors)) => {
                let paths: Vec<&str> = errors.errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec!["items[0].unitPrice", "discounts[0].value", "shipping.cost"]
                );
                assert_eq!(
                    errors.errors[0].message,
                    "unitPrice must be between 0 and 1000000000"
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_largest_valid_order_prices() {
        let items: Vec<LineItem> = (0..crate::MAX_LINE_ITEMS)
            .map(|i| {
                LineItem::new(
                    format!("Line {i}"),
                    crate::MAX_LINE_QUANTITY,
                    Money::from_major(MAX_MONEY_AMOUNT),
                )
                .with_tax(Percent::from_whole(100))
            })
            .collect();
        let adjustments = PriceAdjustments {
            discounts: vec![],
            taxes: vec![Adjustment::percentage("Levy", Percent::from_whole(100))],
            shipping: Shipping {
                cost: Money::from_major(MAX_MONEY_AMOUNT),
                handling_fee: Money::from_major(MAX_MONEY_AMOUNT),
            },
        };

        let calc = calculate_price(&items, &adjustments).unwrap();
        // 500 × 100 000 × 10^9
        assert_eq!(calc.subtotal.amount(), Decimal::from(50_000_000_000_000_000i64));
        assert_eq!(
            calc.grand_total,
            calc.subtotal - calc.total_discount + calc.total_tax + calc.shipping_cost
        );
    }

    #[test]
    fn test_line_breakdown_overflow_is_none() {
        let item = LineItem::new("Unchecked", 2, Money::new(Decimal::MAX));
        assert!(LineBreakdown::for_item(&item).is_none());

        let item = LineItem::new("Fine", 2, Money::from_major(10));
        assert_eq!(LineBreakdown::for_item(&item).unwrap().line_total.amount(), dec!(20));
    }

    #[test]
    fn test_full_precision_until_display() {
        // 7 lines at $0.333 with 7.25% tax: per-line rounding would lose cents.
        let items: Vec<LineItem> = (0..7)
            .map(|i| {
                LineItem::new(format!("Shim {i}"), 3, Money::new(dec!(0.333)))
                    .with_tax(Percent::new(dec!(7.25)))
            })
            .collect();
        let calc = calculate_line_totals(&items).unwrap();

        assert_eq!(calc.subtotal.amount(), dec!(6.993));
        assert_eq!(calc.total_tax.amount(), dec!(0.5069925));
        assert_eq!(calc.grand_total.amount(), dec!(7.4999925));
        assert_eq!(calc.rounded().grand_total.amount(), dec!(7.50));
    }

    #[test]
    fn test_pricing_is_idempotent() {
        let items = vec![brake_pads(), LineItem::new("Bolt", 12, Money::from_cents(35))];
        let first = calculate_line_totals(&items).unwrap();
        let second = calculate_line_totals(&items).unwrap();
        assert_eq!(first, second);
    }

    fn arb_line_item() -> impl Strategy<Value = LineItem> {
        (1i64..500, 0i64..1_000_000, 0u32..=10_000, 0u32..=10_000).prop_map(
            |(qty, cents, discount_bps, tax_bps)| {
                LineItem::new("item", qty, Money::from_cents(cents))
                    .with_discount(Percent::new(Decimal::new(discount_bps as i64, 2)))
                    .with_tax(Percent::new(Decimal::new(tax_bps as i64, 2)))
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_grand_total_identity(
            items in prop::collection::vec(arb_line_item(), 0..20),
            shipping_cents in 0i64..100_000,
        ) {
            let adjustments =
                PriceAdjustments::with_shipping(Shipping::flat(Money::from_cents(shipping_cents)));
            let calc = calculate_price(&items, &adjustments).unwrap();

            prop_assert_eq!(
                calc.grand_total,
                calc.subtotal - calc.total_discount + calc.total_tax + calc.shipping_cost
            );
            prop_assert_eq!(calc.per_item_breakdown.len(), items.len());
            prop_assert!(!calc.grand_total.is_negative());
        }

        #[test]
        fn prop_any_unit_price_prices_or_fails_validation(
            mantissa in prop_oneof![0i128..=100_000_000_000, 0i128..=Decimal::MAX.mantissa()],
            scale in 0u32..=6,
            qty in 1i64..=crate::MAX_LINE_QUANTITY,
            tax_whole in 0u32..=100,
        ) {
            let price = Money::new(Decimal::from_i128_with_scale(mantissa, scale));
            let items = vec![LineItem::new("item", qty, price).with_tax(Percent::from_whole(tax_whole))];

            match calculate_line_totals(&items) {
                Ok(calc) => {
                    prop_assert!(price <= Money::from_major(MAX_MONEY_AMOUNT));
                    prop_assert_eq!(calc.grand_total, calc.subtotal + calc.total_tax);
                }
                Err(CoreError::Validation(errors)) => {
                    prop_assert!(price > Money::from_major(MAX_MONEY_AMOUNT));
                    prop_assert_eq!(errors.errors[0].path.as_str(), "items[0].unitPrice");
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        #[test]
        fn prop_line_totals_sum_to_net_plus_tax(
            items in prop::collection::vec(arb_line_item(), 1..20),
        ) {
            let calc = calculate_line_totals(&items).unwrap();
            let lines: Money = calc.per_item_breakdown.iter().map(|l| l.line_total).sum();
            prop_assert_eq!(lines, calc.grand_total);
        }
    }
}
