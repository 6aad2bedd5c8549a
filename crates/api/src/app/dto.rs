use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use backoffice_auth::{NewUser, Role, User};
use backoffice_core::{CustomerId, UserId};
use backoffice_infra::Session;
use backoffice_sales::{OrderFilter, OrderStatus};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// JSON body extractor whose rejections use the API error shape
/// (`400 validation_error`) instead of axum's plain-text 4xx.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection, "rejected request body");
    errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-registration never lets the caller choose a role.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(value: RegisterRequest) -> Self {
        NewUser {
            name: value.name,
            email: value.email,
            password: value.password,
            role: Role::User,
        }
    }
}

/// Query string of `GET /orders`; parsed by hand so bad values get a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub customer_id: Option<String>,
}

impl OrderListQuery {
    pub fn into_filter(self) -> Result<OrderFilter, Response> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(OrderStatus::parse(raw).ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    "status must be one of: pending, processing, completed, cancelled",
                )
            })?),
        };

        let customer_id = match self.customer_id.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<CustomerId>().map_err(errors::invalid_id)?),
        };

        Ok(OrderFilter {
            status,
            customer_id,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Public view of a user; the password hash is never serialized.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: UserResponse::from(&session.user),
            token: session.token.token,
            expires_at: session.token.expires_at,
        }
    }
}

/// Wrap a list the way every collection endpoint does: `{"items": [...]}`.
pub fn items<T: Serialize>(items: Vec<T>) -> serde_json::Value {
    serde_json::json!({ "items": items })
}
