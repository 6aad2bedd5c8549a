use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use backoffice_auth::RouteClass;
use backoffice_core::CustomerId;
use backoffice_customers::{CustomerPatch, NewCustomer};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .route("/", guard.guard(RouteClass::Customers, get(list_customers).post(create_customer)))
        .route(
            "/:id",
            guard.guard(
                RouteClass::Customers,
                get(get_customer).put(update_customer).delete(delete_customer),
            ),
        )
}

fn parse_id(id: &str) -> Result<CustomerId, axum::response::Response> {
    id.parse::<CustomerId>().map_err(errors::invalid_id)
}

pub async fn list_customers(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog.list_customers().await {
        Ok(customers) => (StatusCode::OK, Json(dto::items(customers))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    dto::ApiJson(body): dto::ApiJson<NewCustomer>,
) -> axum::response::Response {
    match services.catalog.create_customer(body, Utc::now()).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.get_customer(id).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    dto::ApiJson(body): dto::ApiJson<CustomerPatch>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.update_customer(id, body).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

/// Orders placed by this customer keep their snapshot.
pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.delete_customer(id).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
