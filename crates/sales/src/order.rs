use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_core::{CustomerId, Entity, OrderId, ProductId};

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Order status lifecycle.
///
/// ```text
/// Pending ──► Processing ──► Completed
///    │             │
///    └─────────────┴──────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Processing) | (Pending, Cancelled) | (Processing, Completed) | (Processing, Cancelled)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl OrderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line items
// ─────────────────────────────────────────────────────────────────────────────

/// Client-side line request: which product, how many. Prices are never taken
/// from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Order line with the product's name and price frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Reject empty item lists and non-positive quantities before any lookup.
pub fn validate_line_requests(items: &[LineRequest]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::validation("order must contain at least one item"));
    }
    for item in items {
        if item.quantity < 1 {
            return Err(OrderError::validation(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if item.quantity > i64::from(i32::MAX) {
            return Err(OrderError::validation(format!(
                "quantity for product {} is too large",
                item.product_id
            )));
        }
    }
    Ok(())
}

/// Σ unit_price × quantity.
pub fn compute_total(items: &[LineItem]) -> Result<Decimal, OrderError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
        .ok_or_else(|| OrderError::validation("order total out of range"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Order
// ─────────────────────────────────────────────────────────────────────────────

/// Who the order is for, as known when it was placed.
///
/// `customer_id` is `None` for guest orders. If the customer record is later
/// edited or deleted the snapshot keeps the original values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: CustomerSnapshot,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    /// Always `compute_total(&items)`; never accepted from a client.
    pub total: Decimal,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Order {
    /// Build a new order from resolved line items.
    ///
    /// New orders start `Pending` unless `Processing` is requested; starting
    /// in a terminal state is rejected as a transition from `Pending`.
    pub fn place(
        id: OrderId,
        customer: CustomerSnapshot,
        items: Vec<LineItem>,
        initial: Option<OrderStatus>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::validation("order must contain at least one item"));
        }

        let status = match initial.unwrap_or(OrderStatus::Pending) {
            s @ (OrderStatus::Pending | OrderStatus::Processing) => s,
            to => {
                return Err(OrderError::InvalidTransition {
                    from: OrderStatus::Pending,
                    to,
                });
            }
        };

        let total = compute_total(&items)?;
        Ok(Self {
            id,
            customer,
            ordered_at: now,
            status,
            items,
            total,
        })
    }

    /// Replace all line items and recompute the total.
    pub fn replace_items(&mut self, items: Vec<LineItem>) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::validation(format!(
                "items of a {} order cannot be changed",
                self.status
            )));
        }
        if items.is_empty() {
            return Err(OrderError::validation("order must contain at least one item"));
        }

        self.total = compute_total(&items)?;
        self.items = items;
        Ok(())
    }

    /// Move to `to`. Returns `false` when already there (no-op).
    pub fn transition(&mut self, to: OrderStatus) -> Result<bool, OrderError> {
        if self.status == to {
            return Ok(false);
        }
        if !self.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(true)
    }

    pub fn is_consistent(&self) -> bool {
        compute_total(&self.items).is_ok_and(|total| total == self.total)
    }
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| s == order.status)
            && self
                .customer_id
                .is_none_or(|c| order.customer.customer_id == Some(c))
    }
}
