use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use backoffice_auth::User;
use backoffice_core::{CustomerId, Email, Entity, OrderId, ProductId, UserId};
use backoffice_customers::Customer;
use backoffice_products::Product;
use backoffice_sales::{Order, OrderFilter, OrderStatus};

use super::{CustomerStore, OrderStore, ProductStore, StoreError, UpdateOutcome, UserStore};
use crate::reports::DailySales;

/// In-memory tables for tests/dev.
///
/// One lock per table; each operation holds it for the whole read-modify-write,
/// which gives the same row atomicity the Postgres adapter gets from
/// single-statement transactions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<Table<User>>,
    customers: RwLock<Table<Customer>>,
    products: RwLock<Table<Product>>,
    orders: RwLock<Table<Order>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::backend("in-memory table lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::backend("in-memory table lock poisoned"))
}

type Table<E> = HashMap<<E as Entity>::Id, E>;

fn put<E: Entity + Clone>(table: &mut Table<E>, row: &E) {
    table.insert(row.id().clone(), row.clone());
}

/// Overwrite an existing row; `false` when there is none.
fn replace<E: Entity + Clone>(table: &mut Table<E>, row: &E) -> bool {
    match table.get_mut(row.id()) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        put(&mut users, user);
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(read(&self.users)?.values().find(|u| &u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = read(&self.users)?.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<bool, StoreError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        Ok(replace(&mut users, user))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(write(&self.users)?.remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut customers = write(&self.customers)?;
        if customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::Duplicate("email"));
        }
        put(&mut customers, customer);
        Ok(())
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(read(&self.customers)?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let mut customers: Vec<Customer> = read(&self.customers)?.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn update(&self, customer: &Customer) -> Result<bool, StoreError> {
        let mut customers = write(&self.customers)?;
        if customers
            .values()
            .any(|c| c.id != customer.id && c.email == customer.email)
        {
            return Err(StoreError::Duplicate("email"));
        }
        Ok(replace(&mut customers, customer))
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        Ok(write(&self.customers)?.remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = write(&self.products)?;
        put(&mut products, product);
        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(read(&self.products)?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = read(&self.products)?.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let mut products = write(&self.products)?;
        Ok(replace(&mut products, product))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(write(&self.products)?.remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = write(&self.orders)?;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate("order id"));
        }
        put(&mut orders, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(read(&self.orders)?.get(&id).cloned())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = read(&self.orders)?
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));
        Ok(orders)
    }

    async fn update(&self, order: &Order, expected_status: OrderStatus) -> Result<UpdateOutcome, StoreError> {
        let mut orders = write(&self.orders)?;
        let Some(slot) = orders.get_mut(&order.id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if slot.status != expected_status {
            return Ok(UpdateOutcome::StatusChanged(slot.status));
        }
        *slot = order.clone();
        Ok(UpdateOutcome::Updated)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        Ok(write(&self.orders)?.remove(&id).is_some())
    }

    async fn daily_sales(&self, since: DateTime<Utc>) -> Result<Vec<DailySales>, StoreError> {
        let orders = read(&self.orders)?;

        let mut by_day: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();
        for order in orders
            .values()
            .filter(|o| o.status != OrderStatus::Cancelled && o.ordered_at >= since)
        {
            let entry = by_day
                .entry(order.ordered_at.date_naive())
                .or_insert((Decimal::ZERO, 0));
            entry.0 = entry
                .0
                .checked_add(order.total)
                .ok_or_else(|| StoreError::backend("daily revenue out of range"))?;
            entry.1 += 1;
        }

        Ok(by_day
            .into_iter()
            .map(|(day, (revenue, orders))| DailySales { day, revenue, orders })
            .collect())
    }
}
