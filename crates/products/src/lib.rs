//! Products domain module (catalog).
//!
//! Pure validation and state rules for catalog entries; no IO, no HTTP, no
//! storage.

pub mod product;

pub use product::{NewProduct, Product, ProductPatch};
