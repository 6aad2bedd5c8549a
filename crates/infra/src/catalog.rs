//! Product and customer maintenance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use backoffice_core::{CustomerId, DomainError, ProductId};
use backoffice_customers::{Customer, CustomerPatch, NewCustomer};
use backoffice_products::{NewProduct, Product, ProductPatch};

use crate::store::{CustomerStore, ProductStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("not found")]
    NotFound,

    #[error("email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate("email") => CatalogError::DuplicateEmail,
            other => CatalogError::Store(other),
        }
    }
}

/// Thin orchestration: validate with the domain crate, then persist.
///
/// Deleting a product or customer never touches orders; they keep their
/// snapshots.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    customers: Arc<dyn CustomerStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self {
            products,
            customers,
        }
    }

    // ── Products ─────────────────────────────────────────────────────────────

    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products.get(id).await?.ok_or(CatalogError::NotFound)
    }

    pub async fn create_product(&self, request: NewProduct, now: DateTime<Utc>) -> Result<Product, CatalogError> {
        let product = request.into_product(ProductId::new(), now)?;
        self.products.insert(&product).await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let mut product = self.get_product(id).await?;
        product.apply(patch)?;
        if !self.products.update(&product).await? {
            return Err(CatalogError::NotFound);
        }
        Ok(product)
    }

    /// Returns the removed product.
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self.get_product(id).await?;
        if !self.products.delete(id).await? {
            return Err(CatalogError::NotFound);
        }
        Ok(product)
    }

    // ── Customers ────────────────────────────────────────────────────────────

    pub async fn list_customers(&self) -> Result<Vec<Customer>, CatalogError> {
        Ok(self.customers.list().await?)
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, CatalogError> {
        self.customers.get(id).await?.ok_or(CatalogError::NotFound)
    }

    pub async fn create_customer(&self, request: NewCustomer, now: DateTime<Utc>) -> Result<Customer, CatalogError> {
        let customer = request.into_customer(CustomerId::new(), now)?;
        self.customers.insert(&customer).await?;
        Ok(customer)
    }

    pub async fn update_customer(&self, id: CustomerId, patch: CustomerPatch) -> Result<Customer, CatalogError> {
        let mut customer = self.get_customer(id).await?;
        customer.apply(patch)?;
        if !self.customers.update(&customer).await? {
            return Err(CatalogError::NotFound);
        }
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: CustomerId) -> Result<Customer, CatalogError> {
        let customer = self.get_customer(id).await?;
        if !self.customers.delete(id).await? {
            return Err(CatalogError::NotFound);
        }
        Ok(customer)
    }
}
