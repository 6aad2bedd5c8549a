use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use backoffice_core::DomainError;
use backoffice_infra::{AccountError, CatalogError, LedgerError, StoreError};
use backoffice_sales::OrderError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// The single response for every authentication failure.
pub fn unauthenticated() -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
}

pub fn invalid_id(err: DomainError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", err.to_string())
}

fn internal(err: &dyn std::fmt::Display) -> axum::response::Response {
    tracing::error!(error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
}

fn duplicate_email() -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "duplicate_email", "email already exists")
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Duplicate("email") => duplicate_email(),
        StoreError::Duplicate(_) | StoreError::Backend(_) => internal(&err),
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Order(e) => match e {
            OrderError::UnknownProduct(_) => {
                json_error(StatusCode::BAD_REQUEST, "unknown_product", e.to_string())
            }
            OrderError::InvalidTransition { .. } => {
                json_error(StatusCode::BAD_REQUEST, "invalid_transition", e.to_string())
            }
            OrderError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
            OrderError::ValidationFailed(msg) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
            }
        },
        LedgerError::Store(e) => store_error_to_response(e),
    }
}

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::InvalidCredentials => unauthenticated(),
        AccountError::DuplicateEmail => duplicate_email(),
        AccountError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        AccountError::Validation(e) => domain_error_to_response(e),
        AccountError::Store(e) => store_error_to_response(e),
        AccountError::Password(_) | AccountError::Token(_) | AccountError::Worker(_) => internal(&err),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Validation(e) => domain_error_to_response(e),
        CatalogError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        CatalogError::DuplicateEmail => duplicate_email(),
        CatalogError::Store(e) => store_error_to_response(e),
    }
}
