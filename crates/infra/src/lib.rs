//! Infrastructure layer: persistence adapters and the application services
//! that orchestrate domain rules over them.
//!
//! - `store`: storage ports (traits) with in-memory and Postgres adapters
//! - `ledger`: order lifecycle orchestration
//! - `accounts`: login, registration and user administration
//! - `catalog`: product and customer maintenance
//! - `reports`: sales aggregation

pub mod accounts;
pub mod catalog;
pub mod ledger;
pub mod reports;
pub mod store;

pub use accounts::{AccountError, AccountService, Session};
pub use catalog::{CatalogError, CatalogService};
pub use ledger::{CustomerRef, LedgerError, NewOrder, OrderLedger, OrderPatch};
pub use reports::{DailySales, SalesReport};
pub use store::{
    CustomerStore, InMemoryStore, OrderStore, PostgresStore, ProductStore, StoreError,
    UpdateOutcome, UserStore,
};
