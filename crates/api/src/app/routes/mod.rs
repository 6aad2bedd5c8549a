use axum::Router;

use crate::middleware::AuthState;

pub mod auth;
pub mod customers;
pub mod orders;
pub mod products;
pub mod reports;
pub mod system;
pub mod users;

/// Router for every policy-governed endpoint. Each route is registered with
/// its `RouteClass`; the guard consults the policy table.
pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .nest("/auth", auth::router(guard))
        .nest("/users", users::router(guard))
        .nest("/customers", customers::router(guard))
        .nest("/products", products::router(guard))
        .nest("/orders", orders::router(guard))
        .nest("/reports", reports::router(guard))
}
