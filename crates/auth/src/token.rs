//! Stateless session tokens (JWT, HS256).
//!
//! Tokens are self-contained: nothing is persisted at issue time and there is
//! no revocation list, so a token stays usable until its `exp` even if the
//! account is deleted or its role changes.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use backoffice_core::UserId;

use crate::claims::{AuthError, SessionClaims, validate_claims};
use crate::Role;

/// Default session lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24 * 7;

/// A freshly minted session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("failed to sign session token: {0}")]
pub struct TokenIssueError(#[from] jsonwebtoken::errors::Error);

/// Issue and verify session tokens.
///
/// Implementations hold only immutable key material and must be safe to share
/// across request tasks without locking.
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenIssueError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError>;
}

/// HMAC-SHA256 signed JWTs with a per-deployment secret.
pub struct Hs256TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn with_default_ttl(secret: &[u8]) -> Self {
        Self::new(secret, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn validation() -> Validation {
        // Expiry is checked against the caller's clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenIssueError> {
        // JWT times are whole seconds; `expires_at` must match `exp` exactly.
        let now = now.trunc_subsecs(0);
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Self::validation())
            .map_err(|e| {
                tracing::trace!(error = %e, "token rejected by decoder");
                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::BadSignature,
                    _ => AuthError::Malformed,
                }
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
