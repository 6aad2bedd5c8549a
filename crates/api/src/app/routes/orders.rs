use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use backoffice_auth::{Identity, RouteClass};
use backoffice_core::OrderId;
use backoffice_infra::{NewOrder, OrderPatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .route(
            "/",
            guard
                .guard(RouteClass::OrdersRead, get(list_orders))
                .merge(guard.guard(RouteClass::OrdersPlace, post(create_order))),
        )
        .route(
            "/:id",
            guard
                .guard(RouteClass::OrdersRead, get(get_order))
                .merge(guard.guard(RouteClass::OrdersWrite, put(update_order).delete(delete_order))),
        )
}

fn parse_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse::<OrderId>().map_err(errors::invalid_id)
}

/// Newest first; `?status=` and `?customer_id=` narrow the list.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match services.ledger.list(filter).await {
        Ok(orders) => (StatusCode::OK, Json(dto::items(orders))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    dto::ApiJson(body): dto::ApiJson<NewOrder>,
) -> axum::response::Response {
    match services.ledger.create(body, Utc::now()).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, placed_by = %identity.user_id, total = %order.total, "order placed");
            (StatusCode::CREATED, Json(order)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.get(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    dto::ApiJson(body): dto::ApiJson<OrderPatch>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.update(id, body).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
