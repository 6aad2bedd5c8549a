//! Customers domain module.
//!
//! Customers are contact records referenced by orders. They carry no
//! credentials; signing in is a `backoffice-auth` user concern.

pub mod customer;

pub use customer::{ContactInfo, Customer, CustomerPatch, NewCustomer};
