//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage adapter selection and application services
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use backoffice_auth::RoutePolicy;

use crate::config::ApiConfig;
use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from ready-made services.
pub fn build_app(services: Arc<AppServices>, auth: AuthState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(&auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        )
}

/// Wire stores, services and the policy table from configuration, then
/// create the bootstrap admin if one is configured.
pub async fn build_from_config(config: &ApiConfig) -> anyhow::Result<Router> {
    let tokens = services::token_service(config);
    let stores = services::stores_from_config(config).await?;
    let services = Arc::new(services::build_services(stores, tokens.clone())?);

    if let Some(admin) = &config.bootstrap_admin {
        let created = services
            .accounts
            .ensure_admin(&admin.name, &admin.email, &admin.password, Utc::now())
            .await?;
        if created {
            tracing::info!(email = %admin.email, "bootstrap admin created");
        }
    }

    let policy = RoutePolicy::standard();
    for (class, access) in policy.entries() {
        tracing::debug!(?class, ?access, "route policy");
    }

    let auth = AuthState {
        tokens,
        policy: Arc::new(policy),
    };
    Ok(build_app(services, auth))
}
