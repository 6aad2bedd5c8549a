//! `backoffice-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod email;
pub mod entity;
pub mod error;
pub mod id;

pub use email::Email;
pub use entity::Entity;
pub use error::{required_text, DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId, UserId};
