//! # Money Module
//!
//! `Money` and `Percent` value types used by the pricing engine.
//!
//! ## Precision Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE ROUNDING HAPPENS                                                 │
//! │                                                                         │
//! │  Line 1: 3 × $0.333 at 7.25% tax  ─┐                                   │
//! │  Line 2: ...                        ├─► Σ in full decimal precision     │
//! │  Line N: ...                       ─┘          │                        │
//! │                                                 ▼                        │
//! │                                  grand_total (unrounded)                │
//! │                                                 │                        │
//! │                                                 ▼                        │
//! │                          Display / rounded() → "$12.35"                 │
//! │                                                                         │
//! │  Rounding each line to cents before summing drifts by up to half a     │
//! │  cent per line. Decimal arithmetic is exact in base 10, so the only    │
//! │  rounding is the final one, at display time.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use keystone_core::money::{Money, Percent};
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_cents(1000);              // $10.00
//! let line = price.multiply_quantity(2);            // $20.00
//! let discount = line.percent_of(Percent::from_whole(10)); // $2.00
//! assert_eq!((line - discount).to_string(), "$18.00");
//! assert_eq!(Money::new(Decimal::new(18_905, 3)).rounded().amount(), Decimal::new(1890, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of decimal places shown for money.
pub const DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the shop currency.
///
/// ## Design Decisions
/// - **Decimal, not f64**: `0.1 + 0.2 == 0.3` holds, so totals compare exactly
/// - **Unrounded internally**: per-line discount and tax keep every digit
/// - **Signed**: refunds and adjustments can be negative
///
/// ## Where Money Flows
/// ```text
/// LineItem.unit_price ──► line subtotal ──► discount ──► tax ──► line total
///                                                                   │
///          PriceCalculation.grand_total ◄── Σ lines + shipping ◄────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates money from the smallest currency unit (cents).
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    /// assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates money from a whole number of currency units.
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// The raw, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to [`DISPLAY_DECIMALS`] using banker's rounding.
    ///
    /// ## Bankers Rounding
    /// Half-way values go to the nearest even digit, so rounding a long
    /// column of amounts does not push the sum up systematically.
    /// ```text
    /// 0.125 → 0.12    0.135 → 0.14    0.145 → 0.14
    /// ```
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::new(Decimal::new(125, 3)).rounded(), Money::from_cents(12));
    /// assert_eq!(Money::new(Decimal::new(135, 3)).rounded(), Money::from_cents(14));
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Multiplies by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `percent` of this amount, unrounded.
    ///
    /// ```rust
    /// use keystone_core::money::{Money, Percent};
    /// use rust_decimal::Decimal;
    ///
    /// let taxable = Money::from_major(18);
    /// let tax = taxable.percent_of(Percent::from_whole(5));
    /// assert_eq!(tax.amount(), Decimal::new(9, 1)); // 0.9
    /// ```
    #[inline]
    pub fn percent_of(&self, percent: Percent) -> Money {
        Money(self.0 * percent.fraction())
    }

    /// Checked addition; `None` when the sum leaves the `Decimal` range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Checked [`Money::multiply_quantity`].
    ///
    /// ```rust
    /// use keystone_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_major(10)));
    /// assert_eq!(Money::new(Decimal::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Checked [`Money::percent_of`].
    #[inline]
    pub fn checked_percent_of(&self, percent: Percent) -> Option<Money> {
        self.0.checked_mul(percent.fraction()).map(Money)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        if self.is_negative() {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to cents.
///
/// ## Note
/// This is a plain `$` rendering for logs, CSV and the print view.
/// The web frontend applies its own locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let mut abs = rounded.abs();
        abs.rescale(DISPLAY_DECIMALS);
        write!(f, "{}${}", sign, abs)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Percent Type
// =============================================================================

/// A percentage between 0 and 100 inclusive.
///
/// `Percent::from_whole(5)` is 5%, `Percent::new(Decimal::new(725, 2))` is 7.25%.
/// Values outside the range can be constructed (they arrive from JSON) but
/// are caught by [`Percent::validate`] before pricing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct Percent(#[ts(type = "string")] Decimal);

impl Percent {
    pub const MAX: Decimal = Decimal::ONE_HUNDRED;

    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Percent(value)
    }

    #[inline]
    pub fn from_whole(pct: u32) -> Self {
        Percent(Decimal::from(pct))
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(Decimal::ZERO)
    }

    /// The percentage value (5% → 5).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// The multiplier (5% → 0.05).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks the 0–100 range, naming `field` in the error.
    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if self.0 < Decimal::ZERO || self.0 > Self::MAX {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: "0".to_string(),
                max: "100".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
