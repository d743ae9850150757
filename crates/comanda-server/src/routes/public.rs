//! Customer-facing routes under `/v1/{tenant_slug}`.
//!
//! No accounts here: ordering is authorized by a table session minted
//! from a printed access code, and an order id works as the capability
//! to poll that order. Everything is rate limited per client IP.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use comanda_auth::token::{generate_refresh_token, hash_refresh_token};
use comanda_core::error::Error;
use comanda_core::models::feedback::{CreateFeedback, Feedback};
use comanda_core::models::menu::MenuItem;
use comanda_core::models::order::{Order, OrderChannel, OrderItemStatus, OrderStatus};
use comanda_core::models::session::CreateSession;
use comanda_core::repository::{PaginatedResult, SessionRepository};
use comanda_service::{PlaceOrder, PlaceOrderLine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::RequestMeta;
use crate::rate_limit::public_rate_limit;
use crate::routes::{PageQuery, resolve_tenant};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{tenant_slug}/menu", get(customer_menu))
        .route("/{tenant_slug}/orders", post(place_order))
        .route("/{tenant_slug}/orders/{id}", get(order_status))
        .route("/{tenant_slug}/feedback", post(submit_feedback))
        .route("/{tenant_slug}/access-codes/verify", post(verify_access_code))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            public_rate_limit,
        ))
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded" })),
        ),
    }
}

async fn customer_menu(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<MenuItem>>, ApiError> {
    let tenant = resolve_tenant(&state, &tenant_slug).await?;
    let menu = state.menu.customer_menu(tenant.id, page.into()).await?;
    Ok(Json(menu))
}

#[derive(Debug, Deserialize)]
struct SelfServiceOrderBody {
    session_token: String,
    table_label: Option<String>,
    note: Option<String>,
    items: Vec<OrderLineBody>,
}

#[derive(Debug, Deserialize)]
struct OrderLineBody {
    menu_item_id: Uuid,
    quantity: u32,
    note: Option<String>,
}

async fn place_order(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
    Json(body): Json<SelfServiceOrderBody>,
) -> Result<(StatusCode, Json<CustomerOrder>), ApiError> {
    let tenant = resolve_tenant(&state, &tenant_slug).await?;
    authorize_table_session(&state, tenant.id, &body.session_token).await?;
    let order = state
        .orders
        .place(PlaceOrder {
            tenant_id: tenant.id,
            table_label: body.table_label,
            channel: OrderChannel::SelfService,
            placed_by: None,
            note: body.note,
            items: body
                .items
                .into_iter()
                .map(|line| PlaceOrderLine {
                    menu_item_id: line.menu_item_id,
                    quantity: line.quantity,
                    note: line.note,
                })
                .collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

async fn order_status(
    State(state): State<AppState>,
    Path((tenant_slug, id)): Path<(String, Uuid)>,
) -> Result<Json<CustomerOrder>, ApiError> {
    let tenant = resolve_tenant(&state, &tenant_slug).await?;
    let order = state.orders.get(tenant.id, id).await?;
    Ok(Json(order.into()))
}

#[derive(Debug, Deserialize)]
struct FeedbackBody {
    order_id: Option<Uuid>,
    rating: u8,
    comment: Option<String>,
}

async fn submit_feedback(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
    Json(body): Json<FeedbackBody>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    let tenant = resolve_tenant(&state, &tenant_slug).await?;
    let feedback = state
        .feedback
        .submit(CreateFeedback {
            tenant_id: tenant.id,
            order_id: body.order_id,
            rating: body.rating,
            comment: body.comment,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[derive(Debug, Deserialize)]
struct VerifyCodeBody {
    code: String,
}

/// Response to a successful code verification: the opaque token the
/// ordering page sends back with each order.
#[derive(Debug, Serialize)]
struct TableSessionBody {
    session_token: String,
    expires_at: DateTime<Utc>,
    label: Option<String>,
    uses_left: u32,
}

async fn verify_access_code(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
    meta: RequestMeta,
    Json(body): Json<VerifyCodeBody>,
) -> Result<Json<TableSessionBody>, ApiError> {
    let tenant = resolve_tenant(&state, &tenant_slug).await?;
    let submitted = body.code.trim().to_ascii_uppercase();
    // An unknown, exhausted or revoked code all read the same from
    // outside; only a disabled feature or suspended tenant says more.
    let code = match state.access_codes.redeem(tenant.id, &submitted).await {
        Ok(code) => code,
        Err(Error::NotFound { .. }) => return Err(invalid_code()),
        Err(err) => return Err(err.into()),
    };

    let token = generate_refresh_token();
    let mut expires_at =
        Utc::now() + Duration::seconds(state.config.customer_session_ttl_secs as i64);
    if let Some(code_expiry) = code.expires_at {
        expires_at = expires_at.min(code_expiry);
    }
    state
        .sessions
        .create(CreateSession {
            tenant_id: tenant.id,
            user_id: code.id,
            refresh_token_hash: hash_refresh_token(&token),
            ip_address: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            expires_at,
        })
        .await?;

    Ok(Json(TableSessionBody {
        session_token: token,
        expires_at,
        label: code.label,
        uses_left: code.max_uses.saturating_sub(code.use_count),
    }))
}

async fn authorize_table_session(
    state: &AppState,
    tenant_id: Uuid,
    token: &str,
) -> Result<(), ApiError> {
    let hash = hash_refresh_token(token);
    let session = match state.sessions.get_by_token_hash(tenant_id, &hash).await {
        Ok(session) => session,
        Err(Error::NotFound { .. }) => return Err(invalid_session()),
        Err(err) => return Err(err.into()),
    };
    if session.expires_at <= Utc::now() {
        state.sessions.invalidate(tenant_id, session.id).await?;
        return Err(invalid_session());
    }
    Ok(())
}

fn invalid_code() -> ApiError {
    Error::AuthenticationFailed {
        reason: "code is not valid".into(),
    }
    .into()
}

fn invalid_session() -> ApiError {
    Error::AuthenticationFailed {
        reason: "table session is not valid".into(),
    }
    .into()
}

/// Order as shown to the customer who placed it. Staff-only fields
/// (channel, placing user) stay off the public wire.
#[derive(Debug, Serialize)]
pub struct CustomerOrder {
    pub id: Uuid,
    pub status: OrderStatus,
    pub table_label: Option<String>,
    pub note: Option<String>,
    pub total_cents: i64,
    pub items: Vec<CustomerOrderItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CustomerOrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub status: OrderItemStatus,
    pub note: Option<String>,
}

impl From<Order> for CustomerOrder {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            table_label: order.table_label,
            note: order.note,
            total_cents: order.total_cents,
            items: order
                .items
                .into_iter()
                .map(|item| CustomerOrderItem {
                    name: item.name,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    status: item.status,
                    note: item.note,
                })
                .collect(),
            created_at: order.created_at,
        }
    }
}
