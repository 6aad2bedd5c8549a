use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backoffice_core::{DomainError, DomainResult, Entity, ProductId, required_text};

/// Catalog entry.
///
/// `price` is the current list price; orders copy it at placement time, so
/// later edits never change existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Units on hand. Informational; order placement does not reserve stock.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_price(price: Decimal) -> DomainResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price must not be negative"));
    }
    Ok(price)
}

fn check_stock(stock: i64) -> DomainResult<i64> {
    if stock < 0 {
        return Err(DomainError::validation("stock must not be negative"));
    }
    Ok(stock)
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Defaults to zero.
    pub stock: Option<i64>,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> DomainResult<Product> {
        Ok(Product {
            id,
            name: required_text("name", &self.name)?,
            description: clean_description(self.description),
            price: check_price(self.price)?,
            stock: check_stock(self.stock.unwrap_or(0))?,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl Product {
    /// Apply a patch, all-or-nothing.
    pub fn apply(&mut self, patch: ProductPatch) -> DomainResult<()> {
        let name = match &patch.name {
            Some(n) => required_text("name", n)?,
            None => self.name.clone(),
        };
        let price = match patch.price {
            Some(p) => check_price(p)?,
            None => self.price,
        };
        let stock = match patch.stock {
            Some(s) => check_stock(s)?,
            None => self.stock,
        };

        self.name = name;
        self.price = price;
        self.stock = stock;
        if patch.description.is_some() {
            self.description = clean_description(patch.description);
        }
        Ok(())
    }
}
