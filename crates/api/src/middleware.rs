use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};
use chrono::Utc;
use tracing::debug;

use backoffice_auth::{Access, RouteClass, RoutePolicy, TokenService, authenticate, authorize};

use crate::app::errors;

/// Shared by every guarded route: the token verifier and the policy table.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenService>,
    pub policy: Arc<RoutePolicy>,
}

impl AuthState {
    /// Attach the guard for `class` to `route`.
    ///
    /// Public classes get no layer at all, so no header is ever parsed.
    pub fn guard(&self, class: RouteClass, route: MethodRouter) -> MethodRouter {
        match self.policy.access(class) {
            Access::Public => route,
            access => route.route_layer(from_fn_with_state(
                RouteGuard {
                    tokens: self.tokens.clone(),
                    access,
                },
                auth_middleware,
            )),
        }
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    tokens: Arc<dyn TokenService>,
    access: Access,
}

/// Verify the bearer token, check the route's access requirement and make
/// the caller's `Identity` available to the handler.
pub async fn auth_middleware(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match authenticate(authorization_header(req.headers()), guard.tokens.as_ref(), Utc::now()) {
        Ok(identity) => identity,
        Err(reason) => {
            debug!(?reason, path = %req.uri().path(), "authentication failed");
            return errors::unauthenticated();
        }
    };

    if let Err(e) = authorize(&identity, guard.access) {
        debug!(user_id = %identity.user_id, role = %identity.role, "authorization failed");
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    req.extensions_mut().insert(identity);
    next.run(req).await
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}
