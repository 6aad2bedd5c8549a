use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use backoffice_auth::{NewUser, RouteClass, UserPatch};
use backoffice_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(guard: &AuthState) -> Router {
    Router::new()
        .route("/", guard.guard(RouteClass::Users, get(list_users).post(create_user)))
        .route("/email/:email", guard.guard(RouteClass::Users, get(get_user_by_email)))
        .route("/:id", guard.guard(RouteClass::Users, axum::routing::put(update_user).delete(delete_user)))
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.accounts.list_users().await {
        Ok(users) => {
            let users = users.iter().map(dto::UserResponse::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(dto::items(users))).into_response()
        }
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    dto::ApiJson(body): dto::ApiJson<NewUser>,
) -> axum::response::Response {
    match services.accounts.create_user(body, Utc::now()).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn get_user_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    match services.accounts.find_by_email(&email).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    dto::ApiJson(body): dto::ApiJson<UserPatch>,
) -> axum::response::Response {
    let id = match id.parse::<UserId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_id(e),
    };

    match services.accounts.update_user(id, body).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<UserId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_id(e),
    };

    match services.accounts.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
