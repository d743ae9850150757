//! Route tables for the three API surfaces.
//!
//! `/v1/staff` and `/v1/hq` are nested before the `/v1/{tenant_slug}`
//! tree; static segments win over captures, so the fixed prefixes
//! never collide with tenant slugs (and `staff`/`hq` are reserved at
//! slug validation anyway).

pub mod hq;
pub mod public;
pub mod staff;

use axum::Router;
use axum::routing::get;
use comanda_core::error::Error;
use comanda_core::models::client::Client;
use comanda_core::repository::{ClientRepository, Pagination};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(public::healthz))
        .nest("/v1/staff", staff::routes(state.clone()))
        .nest("/v1/hq", hq::routes(state.clone()))
        .nest("/v1", public::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(crate::middleware::http_span))
        .layer(axum::middleware::from_fn(crate::middleware::request_meta))
        .with_state(state)
}

/// Offset/limit query parameters shared by every list endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_limit() -> u64 {
    50
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        Self {
            offset: query.offset,
            limit: query.limit,
        }
    }
}

/// Resolves a path slug to its tenant. Unknown slugs are a request
/// error, not a 404, so probing for tenants stays uninformative.
pub async fn resolve_tenant(state: &AppState, slug: &str) -> Result<Client, Error> {
    match state.clients.get_by_slug(slug).await {
        Ok(client) => Ok(client),
        Err(Error::NotFound { .. }) => Err(Error::TenantContext),
        Err(err) => Err(err),
    }
}
