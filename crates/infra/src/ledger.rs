//! Order lifecycle orchestration.
//!
//! The `OrderLedger` is the only writer of orders. It resolves references
//! against the customer and product stores, lets the `backoffice-sales` domain
//! rules decide, and persists the outcome:
//!
//! ```text
//! request
//!   ↓
//! 1. Validate shape (items non-empty, quantities ≥ 1), no store access yet
//!   ↓
//! 2. Resolve products (current name + price) and the customer reference
//!   ↓
//! 3. Decide (Order::place / replace_items / transition), total recomputed
//!   ↓
//! 4. Persist (insert, or compare-and-set on the status read in step 2)
//! ```
//!
//! Order placement does not touch product stock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use backoffice_core::{CustomerId, Email, OrderId, required_text};
use backoffice_sales::{
    CustomerSnapshot, LineItem, LineRequest, Order, OrderError, OrderFilter, OrderStatus,
    validate_line_requests,
};

use crate::store::{CustomerStore, OrderStore, ProductStore, StoreError, UpdateOutcome};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Deterministic rejection by the order rules.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A store call failed; nothing is retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Who an order is for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    /// An existing customer record; its name and email are snapshotted.
    Existing { customer_id: CustomerId },
    /// A walk-in customer with no record.
    Guest { name: String, email: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerRef,
    pub items: Vec<LineRequest>,
    /// `Pending` when absent.
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    /// Replaces all items; the total is recomputed from these alone.
    pub items: Option<Vec<LineRequest>>,
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    customers: Arc<dyn CustomerStore>,
}

impl OrderLedger {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        customers: Arc<dyn CustomerStore>,
    ) -> Self {
        Self {
            orders,
            products,
            customers,
        }
    }

    #[instrument(skip(self, request, now), fields(items = request.items.len()), err)]
    pub async fn create(&self, request: NewOrder, now: DateTime<Utc>) -> Result<Order, LedgerError> {
        validate_line_requests(&request.items)?;
        let customer = self.resolve_customer(&request.customer).await?;
        let items = self.resolve_items(&request.items).await?;

        let order = Order::place(OrderId::new(), customer, items, request.status, now)?;
        self.orders.insert(&order).await?;

        debug!(order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    pub async fn get(&self, id: OrderId) -> Result<Order, LedgerError> {
        self.orders
            .get(id)
            .await?
            .ok_or(LedgerError::Order(OrderError::NotFound(id)))
    }

    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, LedgerError> {
        Ok(self.orders.list(filter).await?)
    }

    #[instrument(skip(self, patch), fields(order_id = %id), err)]
    pub async fn update(&self, id: OrderId, patch: OrderPatch) -> Result<Order, LedgerError> {
        if let Some(items) = &patch.items {
            validate_line_requests(items)?;
        }

        let mut order = self.get(id).await?;
        let expected_status = order.status;
        let mut changed = false;

        if let Some(requests) = &patch.items {
            let items = self.resolve_items(requests).await?;
            order.replace_items(items)?;
            changed = true;
        }
        if let Some(status) = patch.status {
            changed |= order.transition(status)?;
        }

        if !changed {
            return Ok(order);
        }

        match self.orders.update(&order, expected_status).await? {
            UpdateOutcome::Updated => Ok(order),
            UpdateOutcome::Missing => Err(OrderError::NotFound(id).into()),
            UpdateOutcome::StatusChanged(actual) => {
                debug!(%actual, expected = %expected_status, "order status changed concurrently");
                Err(OrderError::InvalidTransition {
                    from: actual,
                    to: order.status,
                }
                .into())
            }
        }
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: OrderId) -> Result<(), LedgerError> {
        if self.orders.delete(id).await? {
            Ok(())
        } else {
            Err(OrderError::NotFound(id).into())
        }
    }

    async fn resolve_customer(&self, customer: &CustomerRef) -> Result<CustomerSnapshot, LedgerError> {
        match customer {
            CustomerRef::Existing { customer_id } => {
                let record = self.customers.get(*customer_id).await?.ok_or_else(|| {
                    OrderError::validation(format!("customer {customer_id} does not exist"))
                })?;
                Ok(CustomerSnapshot {
                    customer_id: Some(record.id),
                    name: record.name,
                    email: record.email.to_string(),
                })
            }
            CustomerRef::Guest { name, email } => {
                let name = required_text("customer name", name)
                    .map_err(|e| OrderError::validation(e.to_string()))?;
                let email = Email::parse(email).map_err(|e| OrderError::validation(e.to_string()))?;
                Ok(CustomerSnapshot {
                    customer_id: None,
                    name,
                    email: email.to_string(),
                })
            }
        }
    }

    /// Look up every product now and freeze its name and price into the line.
    async fn resolve_items(&self, requests: &[LineRequest]) -> Result<Vec<LineItem>, LedgerError> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let product = self
                .products
                .get(request.product_id)
                .await?
                .ok_or(OrderError::UnknownProduct(request.product_id))?;

            let quantity = u32::try_from(request.quantity)
                .map_err(|_| OrderError::validation("quantity out of range"))?;

            items.push(LineItem {
                product_id: product.id,
                product_name: product.name,
                quantity,
                unit_price: product.price,
            });
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use backoffice_core::ProductId;
    use backoffice_customers::{ContactInfo, NewCustomer};
    use backoffice_products::{NewProduct, ProductPatch};
    use rust_decimal::Decimal;

    struct Fixture {
        store: Arc<InMemoryStore>,
        ledger: OrderLedger,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let ledger = OrderLedger::new(store.clone(), store.clone(), store.clone());
        Fixture { store, ledger }
    }

    impl Fixture {
        async fn product(&self, name: &str, cents: i64) -> ProductId {
            let product = NewProduct {
                name: name.into(),
                description: None,
                price: Decimal::new(cents, 2),
                stock: Some(10),
            }
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
            ProductStore::insert(&*self.store, &product).await.unwrap();
            product.id
        }

        async fn customer(&self, name: &str, email: &str) -> CustomerId {
            let customer = NewCustomer {
                name: name.into(),
                email: email.into(),
                contact: ContactInfo::default(),
            }
            .into_customer(CustomerId::new(), Utc::now())
            .unwrap();
            CustomerStore::insert(&*self.store, &customer).await.unwrap();
            customer.id
        }
    }

    fn guest() -> CustomerRef {
        CustomerRef::Guest {
            name: "Walk In".into(),
            email: "walkin@example.com".into(),
        }
    }

    fn line(product_id: ProductId, quantity: i64) -> LineRequest {
        LineRequest { product_id, quantity }
    }

    #[tokio::test]
    async fn total_computed_from_current_prices() {
        let fx = fixture();
        let widget = fx.product("Widget", 999).await;

        let order = fx
            .ledger
            .create(
                NewOrder { customer: guest(), items: vec![line(widget, 3)], status: None },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::new(2997, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].product_name, "Widget");
        assert_eq!(order.items[0].unit_price, Decimal::new(999, 2));
    }

    #[tokio::test]
    async fn item_update_recomputes_total() {
        let fx = fixture();
        let thing = fx.product("Thing", 1000).await;

        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(thing, 2)], status: None }, Utc::now())
            .await
            .unwrap();
        assert_eq!(order.total, Decimal::new(2000, 2));

        let updated = fx
            .ledger
            .update(order.id, OrderPatch { items: Some(vec![line(thing, 5)]), status: None })
            .await
            .unwrap();
        assert_eq!(updated.total, Decimal::new(5000, 2));
        assert_eq!(fx.ledger.get(order.id).await.unwrap().total, Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn item_update_uses_price_at_update_time() {
        let fx = fixture();
        let thing = fx.product("Thing", 1000).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(thing, 1)], status: None }, Utc::now())
            .await
            .unwrap();

        let mut product = ProductStore::get(&*fx.store, thing).await.unwrap().unwrap();
        product
            .apply(ProductPatch { price: Some(Decimal::new(1250, 2)), ..ProductPatch::default() })
            .unwrap();
        ProductStore::update(&*fx.store, &product).await.unwrap();

        // Untouched order keeps the old snapshot.
        assert_eq!(fx.ledger.get(order.id).await.unwrap().total, Decimal::new(1000, 2));

        let updated = fx
            .ledger
            .update(order.id, OrderPatch { items: Some(vec![line(thing, 2)]), status: None })
            .await
            .unwrap();
        assert_eq!(updated.total, Decimal::new(2500, 2));
    }

    #[tokio::test]
    async fn pending_to_completed_is_rejected() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 1)], status: None }, Utc::now())
            .await
            .unwrap();

        let err = fx
            .ledger
            .update(order.id, OrderPatch { items: None, status: Some(OrderStatus::Completed) })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed
            })
        ));
        assert_eq!(fx.ledger.get(order.id).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn deleted_product_leaves_order_snapshot_intact() {
        let fx = fixture();
        let gadget = fx.product("Gadget", 450).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(gadget, 2)], status: None }, Utc::now())
            .await
            .unwrap();

        assert!(ProductStore::delete(&*fx.store, gadget).await.unwrap());

        let fetched = fx.ledger.get(order.id).await.unwrap();
        assert_eq!(fetched, order);
        assert_eq!(fetched.items[0].product_name, "Gadget");
        assert_eq!(fetched.total, Decimal::new(900, 2));
    }

    #[tokio::test]
    async fn unknown_product_and_bad_quantities_rejected() {
        let fx = fixture();
        let missing = ProductId::new();

        let err = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(missing, 1)], status: None }, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::UnknownProduct(id)) if id == missing));

        let p = fx.product("P", 100).await;
        let err = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 0)], status: None }, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::ValidationFailed(_))));

        let err = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![], status: None }, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::ValidationFailed(_))));

        assert!(fx.ledger.list(OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn total_beyond_decimal_range_is_rejected() {
        let fx = fixture();
        let pricey = NewProduct {
            name: "Pricey".into(),
            description: None,
            price: Decimal::from_i128_with_scale(10_i128.pow(22), 0),
            stock: Some(1),
        }
        .into_product(ProductId::new(), Utc::now())
        .unwrap();
        ProductStore::insert(&*fx.store, &pricey).await.unwrap();

        let err = fx
            .ledger
            .create(
                NewOrder { customer: guest(), items: vec![line(pricey.id, 100_000_000)], status: None },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Order(OrderError::ValidationFailed(ref msg)) if msg == "order total out of range"
        ));
        assert!(fx.ledger.list(OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_customer_is_snapshotted() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let alice = fx.customer("Alice", "alice@example.com").await;

        let order = fx
            .ledger
            .create(
                NewOrder {
                    customer: CustomerRef::Existing { customer_id: alice },
                    items: vec![line(p, 1)],
                    status: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(order.customer.customer_id, Some(alice));
        assert_eq!(order.customer.name, "Alice");

        assert!(CustomerStore::delete(&*fx.store, alice).await.unwrap());
        let fetched = fx.ledger.get(order.id).await.unwrap();
        assert_eq!(fetched.customer.email, "alice@example.com");

        let filtered = fx
            .ledger
            .list(OrderFilter { status: None, customer_id: Some(alice) })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn missing_customer_is_validation_failure() {
        let fx = fixture();
        let p = fx.product("P", 100).await;

        let err = fx
            .ledger
            .create(
                NewOrder {
                    customer: CustomerRef::Existing { customer_id: CustomerId::new() },
                    items: vec![line(p, 1)],
                    status: None,
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn get_is_idempotent() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 4)], status: None }, Utc::now())
            .await
            .unwrap();

        let first = fx.ledger.get(order.id).await.unwrap();
        let second = fx.ledger.get(order.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn transition_checked_against_latest_status() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 1)], status: None }, Utc::now())
            .await
            .unwrap();

        // Another writer moves the order on behind our back.
        let mut elsewhere = order.clone();
        elsewhere.status = OrderStatus::Cancelled;
        OrderStore::update(&*fx.store, &elsewhere, OrderStatus::Pending).await.unwrap();

        let err = fx
            .ledger
            .update(order.id, OrderPatch { items: None, status: Some(OrderStatus::Processing) })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::InvalidTransition { from: OrderStatus::Cancelled, .. })));
    }

    #[tokio::test]
    async fn same_status_update_is_a_no_op() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 1)], status: None }, Utc::now())
            .await
            .unwrap();

        let same = fx
            .ledger
            .update(order.id, OrderPatch { items: None, status: Some(OrderStatus::Pending) })
            .await
            .unwrap();
        assert_eq!(same, order);
    }

    #[tokio::test]
    async fn delete_is_hard_and_reports_missing() {
        let fx = fixture();
        let p = fx.product("P", 100).await;
        let order = fx
            .ledger
            .create(NewOrder { customer: guest(), items: vec![line(p, 1)], status: None }, Utc::now())
            .await
            .unwrap();

        fx.ledger.delete(order.id).await.unwrap();
        assert!(matches!(
            fx.ledger.get(order.id).await,
            Err(LedgerError::Order(OrderError::NotFound(_)))
        ));
        assert!(matches!(
            fx.ledger.delete(order.id).await,
            Err(LedgerError::Order(OrderError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn update_missing_order_is_not_found() {
        let fx = fixture();
        let err = fx
            .ledger
            .update(OrderId::new(), OrderPatch { items: None, status: Some(OrderStatus::Cancelled) })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Order(OrderError::NotFound(_))));
    }
}
