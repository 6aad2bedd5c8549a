//! Sales orders domain module.
//!
//! Order lifecycle rules (status machine, line item snapshots, totals) as
//! deterministic domain logic: no IO, no HTTP, no storage. Resolving products
//! and customers against the stores is the ledger's job in `backoffice-infra`.

pub mod order;

pub use order::{
    CustomerSnapshot, LineItem, LineRequest, Order, OrderError, OrderFilter, OrderStatus,
    compute_total, validate_line_requests,
};
