//! Service wiring: pick a storage adapter and build the application services
//! on top of it.

use std::sync::Arc;

use anyhow::Context;

use backoffice_auth::{Argon2PasswordHasher, Hs256TokenService, TokenService};
use backoffice_infra::{
    AccountService, CatalogService, CustomerStore, InMemoryStore, OrderLedger, OrderStore,
    PostgresStore, ProductStore, SalesReport, UserStore,
};

use crate::config::ApiConfig;

/// Everything a handler may call; shared via `Extension<Arc<AppServices>>`.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub ledger: OrderLedger,
    pub reports: SalesReport,
}

/// One storage backend seen through each store trait.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::new()))
    }

    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        let store = PostgresStore::connect(database_url)
            .await
            .context("failed to connect to postgres")?;
        Ok(Self::from_backend(Arc::new(store)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + CustomerStore + ProductStore + OrderStore + 'static,
    {
        Self {
            users: backend.clone(),
            customers: backend.clone(),
            products: backend.clone(),
            orders: backend,
        }
    }
}

pub fn build_services(stores: Stores, tokens: Arc<dyn TokenService>) -> anyhow::Result<AppServices> {
    let hasher = Argon2PasswordHasher::new().context("failed to initialise password hasher")?;

    Ok(AppServices {
        accounts: AccountService::new(stores.users, Arc::new(hasher), tokens),
        catalog: CatalogService::new(stores.products.clone(), stores.customers.clone()),
        ledger: OrderLedger::new(stores.orders.clone(), stores.products, stores.customers),
        reports: SalesReport::new(stores.orders),
    })
}

/// Token service for the configured secret and TTL.
pub fn token_service(config: &ApiConfig) -> Arc<dyn TokenService> {
    Arc::new(Hs256TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl))
}

/// Stores selected by `DATABASE_URL`.
pub async fn stores_from_config(config: &ApiConfig) -> anyhow::Result<Stores> {
    match config.database_url.as_deref() {
        Some(url) => {
            tracing::info!("using postgres stores");
            Stores::postgres(url).await
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory stores");
            Ok(Stores::in_memory())
        }
    }
}
