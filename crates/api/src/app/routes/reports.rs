use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;

use backoffice_auth::RouteClass;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(guard: &AuthState) -> Router {
    Router::new().route("/sales", guard.guard(RouteClass::Reports, get(sales_report)))
}

/// Per-day revenue and order count for the trailing 30 days.
pub async fn sales_report(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.reports.daily(Utc::now()).await {
        Ok(days) => (StatusCode::OK, Json(dto::items(days))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
