//! Storage ports.
//!
//! Each store is an `async_trait` object so services can hold
//! `Arc<dyn ...Store>` and run against either adapter:
//!
//! - [`InMemoryStore`]: `RwLock<HashMap>` tables, for dev and tests
//! - [`PostgresStore`]: sqlx over a `PgPool`
//!
//! Stores enforce uniqueness (user email, customer email) and row atomicity;
//! every business rule lives in the domain crates and services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use backoffice_auth::User;
use backoffice_core::{CustomerId, Email, OrderId, ProductId, UserId};
use backoffice_customers::Customer;
use backoffice_products::Product;
use backoffice_sales::{Order, OrderFilter, OrderStatus};

use crate::reports::DailySales;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique field (e.g. email) is already taken.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// Anything the backend could not do; never retried.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result of a compare-and-set order write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The order no longer exists.
    Missing,
    /// Another writer moved the order to this status first.
    StatusChanged(OrderStatus),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate("email")` if the email is taken.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Returns `false` if the user does not exist.
    async fn update(&self, user: &User) -> Result<bool, StoreError>;
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError>;
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    async fn list(&self) -> Result<Vec<Customer>, StoreError>;
    async fn update(&self, customer: &Customer) -> Result<bool, StoreError>;
    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<(), StoreError>;
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn list(&self) -> Result<Vec<Product>, StoreError>;
    async fn update(&self, product: &Product) -> Result<bool, StoreError>;
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    /// Newest first.
    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError>;

    /// Write status, items and total in one atomic step, only if the stored
    /// status still equals `expected_status`.
    async fn update(&self, order: &Order, expected_status: OrderStatus) -> Result<UpdateOutcome, StoreError>;

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError>;

    /// Revenue and order count per UTC day for non-cancelled orders placed at
    /// or after `since`, ascending by day.
    async fn daily_sales(&self, since: DateTime<Utc>) -> Result<Vec<DailySales>, StoreError>;
}
