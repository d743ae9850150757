//! Environment-driven server configuration.
//!
//! Everything has a logged fallback except the JWT signing keys, which
//! the server refuses to start without.

use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use comanda_auth::AuthConfig;
use comanda_db::DbConfig;
use tracing::{info, warn};

use crate::rate_limit::RateLimitConfig;

/// Optional first HQ operator, created at startup when absent.
#[derive(Debug, Clone)]
pub struct HqBootstrap {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Lifetime of a customer table session opened by redeeming an
    /// access code.
    pub customer_session_ttl_secs: u64,
    /// Token bucket applied per client IP on the public routes.
    pub rate_limit: RateLimitConfig,
    pub hq_bootstrap: Option<HqBootstrap>,
}

impl ServerConfig {
    pub fn load() -> Self {
        Self {
            port: try_load("COMANDA_PORT", "8080"),
            db: DbConfig {
                url: try_load("COMANDA_DB_URL", "ws://127.0.0.1:8000"),
                namespace: try_load("COMANDA_DB_NAMESPACE", "comanda"),
                database: try_load("COMANDA_DB_DATABASE", "main"),
                username: try_load("COMANDA_DB_USERNAME", "root"),
                password: try_load("COMANDA_DB_PASSWORD", "root"),
            },
            auth: AuthConfig {
                jwt_private_key_pem: read_pem("COMANDA_JWT_PRIVATE_KEY_FILE"),
                jwt_public_key_pem: read_pem("COMANDA_JWT_PUBLIC_KEY_FILE"),
                access_token_lifetime_secs: try_load("COMANDA_ACCESS_TOKEN_TTL_SECS", "900"),
                refresh_token_lifetime_secs: try_load(
                    "COMANDA_REFRESH_TOKEN_TTL_SECS",
                    "1209600",
                ),
                jwt_issuer: try_load("COMANDA_JWT_ISSUER", "comanda"),
                pepper: optional("COMANDA_PASSWORD_PEPPER"),
            },
            customer_session_ttl_secs: try_load("COMANDA_CUSTOMER_SESSION_TTL_SECS", "7200"),
            rate_limit: RateLimitConfig {
                capacity: try_load("COMANDA_RATE_CAPACITY", "20"),
                refill_per_sec: try_load("COMANDA_RATE_REFILL_PER_SEC", "5"),
            },
            hq_bootstrap: match (
                optional("COMANDA_HQ_BOOTSTRAP_USERNAME"),
                optional("COMANDA_HQ_BOOTSTRAP_PASSWORD"),
            ) {
                (Some(username), Some(password)) => Some(HqBootstrap { username, password }),
                _ => None,
            },
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// The variable names a file holding a PEM key. Both JWT keys are
/// required; there is no usable fallback for signing material.
fn read_pem(key: &str) -> String {
    let path = env::var(key)
        .map_err(|_| {
            warn!("Environment variable {key} must point to a PEM file");
        })
        .expect("Environment misconfigured!");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {path}: {e}");
        })
        .expect("Secrets misconfigured!")
}
