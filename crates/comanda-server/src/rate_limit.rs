//! In-process token-bucket rate limiter for the public routes.
//!
//! One bucket per client IP. This is a bot-protection shim, not an
//! accounting system; state is per-process and resets on restart.

use std::collections::HashMap;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use comanda_core::error::Error;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::middleware::RequestMeta;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Burst size in requests.
    pub capacity: f64,
    /// Sustained rate in requests per second.
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 20.0,
            refill_per_sec: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub async fn allow(&self, key: &str, cfg: &RateLimitConfig) -> bool {
        let now = Instant::now();
        let mut lock = self.buckets.lock().await;
        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + (elapsed * cfg.refill_per_sec)).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Route layer for the public surface: one bucket per client IP,
/// `429` with `retry-after` on exhaustion.
pub async fn public_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<RequestMeta>()
        .and_then(|m| m.client_ip.clone())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.limiter.allow(&key, &state.config.rate_limit).await {
        return ApiError::from(Error::RateLimited).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn burst_is_bounded_by_capacity() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 3.0,
            refill_per_sec: 0.0,
        };

        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", &cfg).await);
        }
        assert!(!limiter.allow("10.0.0.1", &cfg).await);
    }

    #[tokio::test]
    async fn buckets_are_keyed_per_client() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 1.0,
            refill_per_sec: 0.0,
        };

        assert!(limiter.allow("10.0.0.1", &cfg).await);
        assert!(!limiter.allow("10.0.0.1", &cfg).await);
        assert!(limiter.allow("10.0.0.2", &cfg).await);
    }

    #[tokio::test]
    async fn tokens_refill_over_time() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 1.0,
            refill_per_sec: 50.0,
        };

        assert!(limiter.allow("10.0.0.1", &cfg).await);
        assert!(!limiter.allow("10.0.0.1", &cfg).await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(limiter.allow("10.0.0.1", &cfg).await);
    }
}
