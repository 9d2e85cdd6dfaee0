use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Longest accepted token lifetime: one year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn ttl(&self) -> Duration {
        let minutes = u64::try_from(self.ttl_minutes).unwrap_or(0);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL; without one the service keeps users in memory.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").filter(|v| !v.is_empty());
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = get("APP_PORT").unwrap_or_else(|| "8080".into());
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;
        let secret = get("JWT_SECRET")
            .or_else(|| get("SECRET"))
            .context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let ttl_minutes = match get("JWT_TTL_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("JWT_TTL_MINUTES is not a number: {v}"))?,
            None => 60,
        };
        anyhow::ensure!(ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            ttl_minutes <= MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}"
        );

        Ok(Self {
            database_url,
            bind_addr,
            jwt: JwtConfig {
                secret,
                ttl_minutes,
            },
        })
    }
}
