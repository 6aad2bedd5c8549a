use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_core::UserId;

use crate::Role;

/// Session token claims.
///
/// Timestamps are unix seconds, as registered JWT claims are. The signature is
/// checked by [`crate::TokenService`] before these are ever looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user the token was issued to.
    pub sub: UserId,

    /// Role of the user at issue time.
    pub role: Role,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Why a request could not be authenticated.
///
/// The HTTP layer collapses every variant into a single 401; the distinction
/// is kept for logs and tests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingCredential,

    #[error("token could not be decoded")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// Deterministically validate decoded claims against `now`.
///
/// A token is live while `now < exp`; an inverted window is treated as
/// malformed rather than expired.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::Malformed);
    }
    if now.timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(())
}
