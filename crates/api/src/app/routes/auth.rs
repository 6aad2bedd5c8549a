use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use backoffice_auth::{Identity, RouteClass};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .route("/login", guard.guard(RouteClass::Session, post(login)))
        .route("/register", guard.guard(RouteClass::Session, post(register)))
        .route("/me", guard.guard(RouteClass::Me, get(me)))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    dto::ApiJson(body): dto::ApiJson<dto::LoginRequest>,
) -> axum::response::Response {
    match services.accounts.login(&body.email, &body.password, Utc::now()).await {
        Ok(session) => (StatusCode::OK, Json(dto::SessionResponse::from(session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    dto::ApiJson(body): dto::ApiJson<dto::RegisterRequest>,
) -> axum::response::Response {
    match services.accounts.register(body.into(), Utc::now()).await {
        Ok(session) => (StatusCode::CREATED, Json(dto::SessionResponse::from(session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> axum::response::Response {
    match services.accounts.me(identity.user_id).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
