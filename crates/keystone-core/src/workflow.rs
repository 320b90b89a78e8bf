//! # Status Workflows
//!
//! State machines for quotations and orders.
//!
//! ## Quotation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   draft ──send──► sent ──view──► viewed ──accept──► accepted            │
//! │                    │  ╲                │                │               │
//! │                    │   ╲──accept───────┼──────────►     │ convert       │
//! │                  reject             reject              ▼               │
//! │                    │                   │            converted ■         │
//! │                    ▼                   ▼                                │
//! │                 rejected ■  ◄──────────┘                                │
//! │                                                                         │
//! │   draft | sent | viewed | accepted ──expire──► expired ■                │
//! │                                                                         │
//! │   ■ = terminal                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `accepted → converted` must only be requested after an availability check
//! with zero unavailable lines. The command layer enforces that guard; the
//! state machine only knows about edges.
//!
//! ## Order
//! ```text
//! pending ──► confirmed ──► processing ──► shipped ──► delivered ──► returned ■
//!    │            │              │
//!    └────────────┴──────────────┴──► cancelled ■
//! ```
//! Entering `processing` needs an assigned warehouse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Quotation Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Being edited; not yet visible to the customer.
    #[default]
    Draft,
    Sent,
    /// Customer opened the quotation.
    Viewed,
    Accepted,
    Rejected,
    /// Passed `valid_until` before reaching a terminal state.
    Expired,
    /// Turned into an order.
    Converted,
}

/// Events that move a quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuotationAction {
    Send,
    View,
    Accept,
    Reject,
    Convert,
    Expire,
}

impl QuotationStatus {
    pub const ALL: [QuotationStatus; 7] = [
        QuotationStatus::Draft,
        QuotationStatus::Sent,
        QuotationStatus::Viewed,
        QuotationStatus::Accepted,
        QuotationStatus::Rejected,
        QuotationStatus::Expired,
        QuotationStatus::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Viewed => "viewed",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
            QuotationStatus::Converted => "converted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuotationStatus::Converted | QuotationStatus::Rejected | QuotationStatus::Expired
        )
    }

    /// Target of `action` from this status, if the edge exists.
    pub fn next(&self, action: QuotationAction) -> Option<QuotationStatus> {
        use QuotationAction as A;
        use QuotationStatus as S;

        match (self, action) {
            (S::Draft, A::Send) => Some(S::Sent),
            (S::Sent, A::View) => Some(S::Viewed),
            (S::Sent | S::Viewed, A::Accept) => Some(S::Accepted),
            (S::Sent | S::Viewed, A::Reject) => Some(S::Rejected),
            (S::Accepted, A::Convert) => Some(S::Converted),
            (s, A::Expire) if !s.is_terminal() => Some(S::Expired),
            _ => None,
        }
    }

    /// Applies `action`, rejecting edges the workflow does not have.
    ///
    /// ```rust
    /// use keystone_core::workflow::{QuotationAction, QuotationStatus};
    ///
    /// let sent = QuotationStatus::Draft.transition(QuotationAction::Send).unwrap();
    /// assert_eq!(sent, QuotationStatus::Sent);
    /// assert!(QuotationStatus::Draft.transition(QuotationAction::Convert).is_err());
    /// ```
    pub fn transition(&self, action: QuotationAction) -> CoreResult<QuotationStatus> {
        self.next(action)
            .ok_or_else(|| CoreError::InvalidTransition {
                entity: "quotation",
                from: self.to_string(),
                to: action.target().to_string(),
            })
    }

    /// Moves straight to `target`, for APIs that post the desired status.
    pub fn transition_to(&self, target: QuotationStatus) -> CoreResult<QuotationStatus> {
        match QuotationAction::toward(target) {
            Some(action) if self.next(action) == Some(target) => Ok(target),
            _ => Err(CoreError::InvalidTransition {
                entity: "quotation",
                from: self.to_string(),
                to: target.to_string(),
            }),
        }
    }

    pub fn can_transition_to(&self, target: QuotationStatus) -> bool {
        self.transition_to(target).is_ok()
    }
}

impl QuotationAction {
    /// Status this action leads to.
    pub fn target(&self) -> QuotationStatus {
        match self {
            QuotationAction::Send => QuotationStatus::Sent,
            QuotationAction::View => QuotationStatus::Viewed,
            QuotationAction::Accept => QuotationStatus::Accepted,
            QuotationAction::Reject => QuotationStatus::Rejected,
            QuotationAction::Convert => QuotationStatus::Converted,
            QuotationAction::Expire => QuotationStatus::Expired,
        }
    }

    /// Action that leads to `target` (none leads back to draft).
    pub fn toward(target: QuotationStatus) -> Option<QuotationAction> {
        match target {
            QuotationStatus::Draft => None,
            QuotationStatus::Sent => Some(QuotationAction::Send),
            QuotationStatus::Viewed => Some(QuotationAction::View),
            QuotationStatus::Accepted => Some(QuotationAction::Accept),
            QuotationStatus::Rejected => Some(QuotationAction::Reject),
            QuotationStatus::Expired => Some(QuotationAction::Expire),
            QuotationStatus::Converted => Some(QuotationAction::Convert),
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        QuotationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownStatus {
                entity: "quotation",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Confirm,
    StartProcessing,
    Ship,
    Deliver,
    Cancel,
    Return,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Whether staff may still (re)assign the shipping warehouse.
    pub fn allows_warehouse_change(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Shipped
                | OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::Returned
        )
    }

    pub fn next(&self, action: OrderAction) -> Option<OrderStatus> {
        use OrderAction as A;
        use OrderStatus as S;

        match (self, action) {
            (S::Pending, A::Confirm) => Some(S::Confirmed),
            (S::Confirmed, A::StartProcessing) => Some(S::Processing),
            (S::Processing, A::Ship) => Some(S::Shipped),
            (S::Shipped, A::Deliver) => Some(S::Delivered),
            (S::Pending | S::Confirmed | S::Processing, A::Cancel) => Some(S::Cancelled),
            (S::Delivered, A::Return) => Some(S::Returned),
            _ => None,
        }
    }

    /// Applies `action` to an order.
    ///
    /// `warehouse` is the order's current assignment; starting processing
    /// without one fails with `WarehouseRequired`.
    pub fn transition(
        &self,
        action: OrderAction,
        order_number: &str,
        warehouse: Option<&str>,
    ) -> CoreResult<OrderStatus> {
        let target = self.next(action).ok_or_else(|| CoreError::InvalidTransition {
            entity: "order",
            from: self.to_string(),
            to: action.target().to_string(),
        })?;

        if target == OrderStatus::Processing && warehouse.map_or(true, |w| w.trim().is_empty()) {
            return Err(CoreError::WarehouseRequired {
                order_number: order_number.to_string(),
            });
        }

        Ok(target)
    }

    /// Moves straight to `target`.
    pub fn transition_to(
        &self,
        target: OrderStatus,
        order_number: &str,
        warehouse: Option<&str>,
    ) -> CoreResult<OrderStatus> {
        match OrderAction::toward(target) {
            Some(action) if self.next(action) == Some(target) => {
                self.transition(action, order_number, warehouse)
            }
            _ => Err(CoreError::InvalidTransition {
                entity: "order",
                from: self.to_string(),
                to: target.to_string(),
            }),
        }
    }

    /// Fulfilment status implied by entering this order status, if any.
    pub fn implied_fulfillment(&self) -> Option<FulfillmentStatus> {
        match self {
            OrderStatus::Processing => Some(FulfillmentStatus::Picking),
            OrderStatus::Shipped => Some(FulfillmentStatus::Packed),
            OrderStatus::Delivered => Some(FulfillmentStatus::Fulfilled),
            _ => None,
        }
    }
}

impl OrderAction {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Confirm => OrderStatus::Confirmed,
            OrderAction::StartProcessing => OrderStatus::Processing,
            OrderAction::Ship => OrderStatus::Shipped,
            OrderAction::Deliver => OrderStatus::Delivered,
            OrderAction::Cancel => OrderStatus::Cancelled,
            OrderAction::Return => OrderStatus::Returned,
        }
    }

    pub fn toward(target: OrderStatus) -> Option<OrderAction> {
        match target {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(OrderAction::Confirm),
            OrderStatus::Processing => Some(OrderAction::StartProcessing),
            OrderStatus::Shipped => Some(OrderAction::Ship),
            OrderStatus::Delivered => Some(OrderAction::Deliver),
            OrderStatus::Cancelled => Some(OrderAction::Cancel),
            OrderStatus::Returned => Some(OrderAction::Return),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownStatus {
                entity: "order",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Payment / Fulfillment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    PartiallyPaid,
    Paid,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    Picking,
    Packed,
    Fulfilled,
}

// =============================================================================
// Unit Tests
// =============================================================================
