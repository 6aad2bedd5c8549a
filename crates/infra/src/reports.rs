//! Sales reporting.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::store::{OrderStore, StoreError};

/// Revenue and order count for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub day: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
}

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Read-only aggregation over the order store.
#[derive(Clone)]
pub struct SalesReport {
    orders: Arc<dyn OrderStore>,
    window: Duration,
}

impl SalesReport {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self {
            orders,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    /// Daily totals for the trailing window ending at `now`, ascending by day.
    /// Cancelled orders are excluded; days without orders are omitted.
    pub async fn daily(&self, now: DateTime<Utc>) -> Result<Vec<DailySales>, StoreError> {
        self.orders.daily_sales(now - self.window).await
    }
}
