//! COMANDA Server: the axum HTTP surface over the COMANDA services.
//!
//! Three route groups share one router: the public customer surface
//! under `/v1/{tenant_slug}/…` (rate limited, access-code sessions),
//! the staff dashboards under `/v1/staff/…` (JWT, role-checked in the
//! handlers) and the platform console under `/v1/hq/…` (JWT with the
//! HQ scope).

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::{HqBootstrap, ServerConfig};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
