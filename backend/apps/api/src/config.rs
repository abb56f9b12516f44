//! Environment Configuration
//!
//! Reads process environment (after `.env`) into the server settings and the
//! shared `AuthConfig`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, ProviderConfig};
use axum::http::HeaderValue;
use platform::cookie::SameSite;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Process-level settings outside the auth context
#[derive(Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<HeaderValue>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
        })
    }
}

/// Build the auth configuration
///
/// Debug builds fall back to random signing secrets and insecure cookies when
/// the secrets are not set.
pub fn auth_config_from_env() -> anyhow::Result<AuthConfig> {
    let base = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    let access_token_secret = secret("ACCESS_TOKEN_SECRET_KEY", &base.access_token_secret)?;
    let refresh_token_secret = secret("REFRESH_TOKEN_SECRET_KEY", &base.refresh_token_secret)?;
    if access_token_secret == refresh_token_secret {
        bail!("ACCESS_TOKEN_SECRET_KEY and REFRESH_TOKEN_SECRET_KEY must differ");
    }

    let cookie_secure = match env::var("COOKIE_SECURE") {
        Ok(value) => value
            .parse()
            .context("COOKIE_SECURE must be true or false")?,
        Err(_) => base.cookie_secure,
    };

    let cookie_same_site = match env::var("COOKIE_SAME_SITE") {
        Ok(value) => value.parse::<SameSite>().map_err(anyhow::Error::msg)?,
        Err(_) => base.cookie_same_site,
    };

    Ok(AuthConfig {
        access_token_secret,
        refresh_token_secret,
        cookie_secure,
        cookie_same_site,
        password_pepper: env::var("PASSWORD_PEPPER").ok().map(String::into_bytes),
        provider_timeout: seconds("PROVIDER_TIMEOUT_SECS", base.provider_timeout)?,
        store_timeout: seconds("STORE_TIMEOUT_SECS", base.store_timeout)?,
        kakao: provider("KAKAO")?,
        naver: provider("NAVER")?,
        ..base
    })
}

fn secret(name: &str, fallback: &[u8]) -> anyhow::Result<Vec<u8>> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
        _ if !fallback.is_empty() => {
            tracing::warn!(variable = name, "Signing secret not set, using a random one");
            Ok(fallback.to_vec())
        }
        _ => bail!("{name} must be set"),
    }
}

fn seconds(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{name} must be a whole number of seconds"))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

fn provider(prefix: &str) -> anyhow::Result<ProviderConfig> {
    let var = |suffix: &str| {
        let name = format!("{prefix}_{suffix}");
        env::var(&name).with_context(|| format!("{name} must be set"))
    };

    Ok(ProviderConfig {
        client_id: var("ID")?,
        client_secret: var("SECRET")?,
        redirect_uri: var("REDIRECT_URI")?,
    })
}
