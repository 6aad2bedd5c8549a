use chrono::{DateTime, Utc};

use crate::claims::AuthError;
use crate::principal::Identity;
use crate::token::TokenService;

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(raw_header: Option<&str>) -> Result<&str, AuthError> {
    let header = raw_header.ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Resolve the caller's identity from the raw authorization header.
///
/// The identity is derived from the verified token alone; the credential
/// store is not consulted.
pub fn authenticate(
    raw_header: Option<&str>,
    tokens: &dyn TokenService,
    now: DateTime<Utc>,
) -> Result<Identity, AuthError> {
    let token = bearer_token(raw_header)?;
    let claims = tokens.verify(token, now)?;

    Ok(Identity {
        user_id: claims.sub,
        role: claims.role,
    })
}
