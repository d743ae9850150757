use thiserror::Error;

/// Errors produced by COMANDA services and repositories.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: &'static str },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Feature not available on current plan: {feature}")]
    FeatureNotAvailable { feature: String },

    #[error("Plan limit exceeded: {limit} (max {max})")]
    LimitExceeded { limit: String, max: u64 },

    #[error("Subscription is not active: {status}")]
    SubscriptionInactive { status: String },

    #[error("Entitlement snapshot is stale ({age_hours}h old)")]
    EntitlementsStale { age_hours: i64 },

    #[error("Entitlements unavailable")]
    EntitlementsUnavailable,

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Rate limited")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PosResult<T> = Result<T, Error>;
