//! HQ console routes under `/v1/hq`.
//!
//! The platform surface: operator login plus client (tenant) lifecycle.
//! Plan, status and renewal changes go through dedicated endpoints so
//! each one lands in the subscription event log with the acting
//! operator attached.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use comanda_auth::{HqLoginInput, HqRefreshInput};
use comanda_core::models::client::{Client, ClientStatus, CreateClient, Plan, UpdateClient};
use comanda_core::models::entitlement::Entitlements;
use comanda_core::models::subscription::SubscriptionEvent;
use comanda_core::repository::PaginatedResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::HqContext;
use crate::error::ApiError;
use crate::middleware::RequestMeta;
use crate::routes::PageQuery;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", get(get_client).patch(update_client))
        .route("/clients/{id}/plan", post(change_plan))
        .route("/clients/{id}/status", post(change_status))
        .route("/clients/{id}/renew", post(renew))
        .route(
            "/clients/{id}/subscription-events",
            get(subscription_events),
        )
        .route("/clients/{id}/entitlements", get(entitlements))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            crate::auth::require_hq,
        ));

    open.merge(protected)
}

// --- auth -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenPairBody {
    access_token: String,
    refresh_token: String,
    session_id: Uuid,
    expires_in: u64,
    token_type: &'static str,
}

async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenPairBody>, ApiError> {
    let out = state
        .hq_auth
        .login(HqLoginInput {
            username: body.username,
            password: body.password,
            ip_address: meta.client_ip,
            user_agent: meta.user_agent,
        })
        .await?;
    Ok(Json(TokenPairBody {
        access_token: out.access_token,
        refresh_token: out.refresh_token,
        session_id: out.session_id,
        expires_in: out.expires_in,
        token_type: "Bearer",
    }))
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(body): Json<RefreshBody>,
) -> Result<Json<TokenPairBody>, ApiError> {
    let out = state
        .hq_auth
        .refresh(HqRefreshInput {
            raw_refresh_token: body.refresh_token,
            ip_address: meta.client_ip,
            user_agent: meta.user_agent,
        })
        .await?;
    Ok(Json(TokenPairBody {
        access_token: out.access_token,
        refresh_token: out.refresh_token,
        session_id: out.session_id,
        expires_in: out.expires_in,
        token_type: "Bearer",
    }))
}

#[derive(Debug, Deserialize)]
struct LogoutBody {
    session_id: Uuid,
}

async fn logout(
    State(state): State<AppState>,
    _ctx: HqContext,
    Json(body): Json<LogoutBody>,
) -> Result<StatusCode, ApiError> {
    state.hq_auth.logout(body.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- clients --------------------------------------------------------

async fn list_clients(
    State(state): State<AppState>,
    _ctx: HqContext,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<Client>>, ApiError> {
    let clients = state.hq.list_clients(page.into()).await?;
    Ok(Json(clients))
}

async fn create_client(
    State(state): State<AppState>,
    _ctx: HqContext,
    Json(body): Json<CreateClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state.hq.create_client(body).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(state): State<AppState>,
    _ctx: HqContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    let client = state.hq.get_client(id).await?;
    Ok(Json(client))
}

async fn update_client(
    State(state): State<AppState>,
    _ctx: HqContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateClient>,
) -> Result<Json<Client>, ApiError> {
    let client = state.hq.update_client(id, body).await?;
    Ok(Json(client))
}

#[derive(Debug, Deserialize)]
struct ChangePlanBody {
    plan: Plan,
}

async fn change_plan(
    State(state): State<AppState>,
    ctx: HqContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangePlanBody>,
) -> Result<Json<Client>, ApiError> {
    let client = state
        .hq
        .change_plan(id, body.plan, Some(ctx.operator_id))
        .await?;
    Ok(Json(client))
}

#[derive(Debug, Deserialize)]
struct ChangeStatusBody {
    status: ClientStatus,
}

async fn change_status(
    State(state): State<AppState>,
    ctx: HqContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeStatusBody>,
) -> Result<Json<Client>, ApiError> {
    let client = state
        .hq
        .change_status(id, body.status, Some(ctx.operator_id))
        .await?;
    Ok(Json(client))
}

#[derive(Debug, Deserialize)]
struct RenewBody {
    period_end: DateTime<Utc>,
}

async fn renew(
    State(state): State<AppState>,
    ctx: HqContext,
    Path(id): Path<Uuid>,
    Json(body): Json<RenewBody>,
) -> Result<Json<Client>, ApiError> {
    let client = state
        .hq
        .renew(id, body.period_end, Some(ctx.operator_id))
        .await?;
    Ok(Json(client))
}

async fn subscription_events(
    State(state): State<AppState>,
    _ctx: HqContext,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<SubscriptionEvent>>, ApiError> {
    let events = state.hq.subscription_events(id, page.into()).await?;
    Ok(Json(events))
}

async fn entitlements(
    State(state): State<AppState>,
    _ctx: HqContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Entitlements>, ApiError> {
    let view = state.hq.entitlements(id).await?;
    Ok(Json(view))
}
