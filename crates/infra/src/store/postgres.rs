//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate(field)`, field from the constraint name |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |
//!
//! Rows that fail to decode into domain types (unknown role or status,
//! malformed email) are also reported as `Backend`.
//!
//! ## Order writes
//!
//! An order and its items are written in one transaction. Updates are
//! compare-and-set on `status`: the `UPDATE ... WHERE id = $1 AND status = $2`
//! either claims the row or tells us someone else moved it first.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use backoffice_auth::{Role, User};
use backoffice_core::{CustomerId, Email, OrderId, ProductId, UserId};
use backoffice_customers::{ContactInfo, Customer};
use backoffice_products::Product;
use backoffice_sales::{CustomerSnapshot, LineItem, Order, OrderFilter, OrderStatus};

use super::{CustomerStore, OrderStore, ProductStore, StoreError, UpdateOutcome, UserStore};
use crate::reports::DailySales;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// All four stores over one connection pool.
///
/// `Send + Sync`; clone freely (the pool is shared).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the idempotent schema script.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role").map_err(|e| map_sqlx_error("decode user", e))?;
    let email: String = row.try_get("email").map_err(|e| map_sqlx_error("decode user", e))?;
    let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("decode user", e))?;

    Ok(User {
        id: UserId::from_uuid(id),
        name: row.try_get("name").map_err(|e| map_sqlx_error("decode user", e))?,
        email: Email::parse(&email).map_err(|e| StoreError::backend(format!("decode user: {e}")))?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::backend(format!("decode user: {e}")))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| map_sqlx_error("decode user", e))?,
        created_at: row.try_get("created_at").map_err(|e| map_sqlx_error("decode user", e))?,
    })
}

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, password_hash, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert user", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find user by email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, role = $4, password_hash = $5 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let decode = |e| map_sqlx_error("decode customer", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let email: String = row.try_get("email").map_err(decode)?;

    Ok(Customer {
        id: CustomerId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        email: Email::parse(&email).map_err(|e| StoreError::backend(format!("decode customer: {e}")))?,
        contact: ContactInfo {
            phone: row.try_get("phone").map_err(decode)?,
            address: row.try_get("address").map_err(decode)?,
        },
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, address, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(customer.email.as_str())
        .bind(&customer.contact.phone)
        .bind(&customer.contact.address)
        .bind(customer.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert customer", e))?;
        Ok(())
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, phone, address, created_at FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get customer", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query("SELECT id, name, email, phone, address, created_at FROM customers ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list customers", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn update(&self, customer: &Customer) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE customers SET name = $2, email = $3, phone = $4, address = $5 WHERE id = $1")
            .bind(customer.id.as_uuid())
            .bind(&customer.name)
            .bind(customer.email.as_str())
            .bind(&customer.contact.phone)
            .bind(&customer.contact.address)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update customer", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete customer", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let decode = |e| map_sqlx_error("decode product", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;

    Ok(Product {
        id: ProductId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        stock: row.try_get("stock").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products (id, name, description, price, stock, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert product", e))?;
        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, name, description, price, stock, created_at FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description, price, stock, created_at FROM products ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, stock = $5 WHERE id = $1")
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete product", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
    OrderStatus::parse(raw).ok_or_else(|| StoreError::backend(format!("unknown order status '{raw}'")))
}

fn order_header_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let decode = |e| map_sqlx_error("decode order", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let customer_id: Option<Uuid> = row.try_get("customer_id").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;

    Ok(Order {
        id: OrderId::from_uuid(id),
        customer: CustomerSnapshot {
            customer_id: customer_id.map(CustomerId::from_uuid),
            name: row.try_get("customer_name").map_err(decode)?,
            email: row.try_get("customer_email").map_err(decode)?,
        },
        ordered_at: row.try_get("ordered_at").map_err(decode)?,
        status: parse_status(&status)?,
        items: Vec::new(),
        total: row.try_get("total").map_err(decode)?,
    })
}

fn line_from_row(row: &PgRow) -> Result<(Uuid, LineItem), StoreError> {
    let decode = |e| map_sqlx_error("decode order item", e);
    let order_id: Uuid = row.try_get("order_id").map_err(decode)?;
    let product_id: Uuid = row.try_get("product_id").map_err(decode)?;
    let quantity: i32 = row.try_get("quantity").map_err(decode)?;

    Ok((
        order_id,
        LineItem {
            product_id: ProductId::from_uuid(product_id),
            product_name: row.try_get("product_name").map_err(decode)?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::backend(format!("negative quantity {quantity} in order {order_id}")))?,
            unit_price: row.try_get("unit_price").map_err(decode)?,
        },
    ))
}

const ORDER_COLUMNS: &str = "id, customer_id, customer_name, customer_email, ordered_at, status, total";

impl PostgresStore {
    /// Attach items to already-loaded order headers (one query for all).
    async fn load_items(&self, orders: &mut [Order]) -> Result<(), StoreError> {
        if orders.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| *o.id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load order items", e))?;

        let mut by_order: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in &rows {
            let (order_id, line) = line_from_row(row)?;
            by_order.entry(order_id).or_default().push(line);
        }
        for order in orders.iter_mut() {
            order.items = by_order.remove(order.id.as_uuid()).unwrap_or_default();
        }
        Ok(())
    }
}

async fn write_items(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<(), StoreError> {
    for (idx, item) in order.items.iter().enumerate() {
        let quantity = i32::try_from(item.quantity)
            .map_err(|_| StoreError::backend(format!("quantity {} out of range", item.quantity)))?;
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, line_no, product_id, product_name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(idx as i32 + 1)
        .bind(item.product_id.as_uuid())
        .bind(&item.product_name)
        .bind(quantity)
        .bind(item.unit_price)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert order item", e))?;
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(order_id = %order.id), err)]
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, customer_name, customer_email, ordered_at, status, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer.customer_id.map(Uuid::from))
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(order.ordered_at)
        .bind(order.status.as_str())
        .bind(order.total)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert order", e))?;

        write_items(&mut tx, order).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut orders = vec![order_header_from_row(&row)?];
        self.load_items(&mut orders).await?;
        Ok(orders.pop())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
            ORDER BY ordered_at DESC, id DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.customer_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list orders", e))?;

        let mut orders = rows
            .iter()
            .map(order_header_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_items(&mut orders).await?;
        Ok(orders)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, expected = %expected_status), err)]
    async fn update(&self, order: &Order, expected_status: OrderStatus) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;

        let claimed = sqlx::query("UPDATE orders SET status = $3, total = $4 WHERE id = $1 AND status = $2")
            .bind(order.id.as_uuid())
            .bind(expected_status.as_str())
            .bind(order.status.as_str())
            .bind(order.total)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update order", e))?;

        if claimed.rows_affected() == 0 {
            let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                .bind(order.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("read order status", e))?;
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;

            return match current {
                None => Ok(UpdateOutcome::Missing),
                Some(status) => Ok(UpdateOutcome::StatusChanged(parse_status(&status)?)),
            };
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear order items", e))?;
        write_items(&mut tx, order).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(UpdateOutcome::Updated)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete order", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn daily_sales(&self, since: DateTime<Utc>) -> Result<Vec<DailySales>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT (ordered_at AT TIME ZONE 'UTC')::date AS day,
                   SUM(total) AS revenue,
                   COUNT(*) AS orders
            FROM orders
            WHERE ordered_at >= $1 AND status <> 'cancelled'
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("daily sales", e))?;

        rows.iter()
            .map(|row| {
                let decode = |e| map_sqlx_error("decode daily sales", e);
                let day: NaiveDate = row.try_get("day").map_err(decode)?;
                let revenue: Decimal = row.try_get("revenue").map_err(decode)?;
                let orders: i64 = row.try_get("orders").map_err(decode)?;
                Ok(DailySales { day, revenue, orders })
            })
            .collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(duplicate_field(db_err.constraint()));
            }
            StoreError::backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::backend(format!("connection pool closed in {operation}")),
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Field behind a unique violation, from the constraint Postgres names.
fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key" | "customers_email_key") => "email",
        Some("orders_pkey") => "order id",
        Some("order_items_pkey") => "order line",
        Some(name) if name.ends_with("_pkey") => "id",
        _ => "unique key",
    }
}
