use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use backoffice_auth::RouteClass;
use backoffice_core::ProductId;
use backoffice_products::{NewProduct, ProductPatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

/// Reads are `CatalogRead`, writes `CatalogWrite`; the two are merged per path.
pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .route(
            "/",
            guard
                .guard(RouteClass::CatalogRead, get(list_products))
                .merge(guard.guard(RouteClass::CatalogWrite, post(create_product))),
        )
        .route(
            "/:id",
            guard
                .guard(RouteClass::CatalogRead, get(get_product))
                .merge(guard.guard(RouteClass::CatalogWrite, put(update_product).delete(delete_product))),
        )
}

fn parse_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse::<ProductId>().map_err(errors::invalid_id)
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog.list_products().await {
        Ok(products) => (StatusCode::OK, Json(dto::items(products))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.get_product(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    dto::ApiJson(body): dto::ApiJson<NewProduct>,
) -> axum::response::Response {
    match services.catalog.create_product(body, Utc::now()).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    dto::ApiJson(body): dto::ApiJson<ProductPatch>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.update_product(id, body).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.delete_product(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
