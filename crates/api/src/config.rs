//! Process configuration read from the environment.

use std::net::SocketAddr;

use anyhow::Context;
use chrono::Duration;

use backoffice_auth::token::DEFAULT_TTL_HOURS;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// First admin account, created on startup if its email is not taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Postgres when set; in-memory stores otherwise.
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let ttl_hours = match get("TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .with_context(|| format!("TOKEN_TTL_HOURS must be a positive integer, got {raw:?}"))?,
            None => DEFAULT_TTL_HOURS,
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: get("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => anyhow::bail!("BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            database_url: get("DATABASE_URL"),
            bootstrap_admin,
        })
    }
}
