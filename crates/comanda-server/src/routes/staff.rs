//! Staff dashboard routes under `/v1/staff`.
//!
//! Login and refresh are open; everything else requires a staff-scoped
//! bearer token. The token pins the tenant, so no handler here takes a
//! tenant from the caller. Role checks live in the handlers: which
//! statuses a role may set depends on the target, not the route.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use comanda_auth::{LoginInput, RefreshInput};
use comanda_core::error::Error;
use comanda_core::models::access_code::AccessCode;
use comanda_core::models::feedback::Feedback;
use comanda_core::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use comanda_core::models::order::{
    Order, OrderChannel, OrderItemStatus, OrderStatus, SalesSummary,
};
use comanda_core::models::staff::{
    CreateStaffUser, StaffRole, StaffStatus, StaffUser, UpdateStaffUser,
};
use comanda_core::repository::{PaginatedResult, Pagination};
use comanda_service::{MintAccessCode, OrderView, PlaceOrder, PlaceOrderLine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::StaffContext;
use crate::error::ApiError;
use crate::middleware::RequestMeta;
use crate::routes::{PageQuery, resolve_tenant};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", post(set_order_status))
        .route("/orders/{id}/items/{item_id}/status", post(set_item_status))
        .route("/menu", get(list_menu).post(create_menu_item))
        .route(
            "/menu/{id}",
            patch(update_menu_item).delete(delete_menu_item),
        )
        .route("/feedback", get(list_feedback))
        .route("/access-codes", get(list_access_codes).post(mint_access_code))
        .route("/access-codes/{id}/revoke", post(revoke_access_code))
        .route("/users", get(list_staff).post(create_staff))
        .route(
            "/users/{id}",
            get(get_staff).patch(update_staff).delete(delete_staff),
        )
        .route("/users/{id}/password", post(set_staff_password))
        .route("/reports/sales", get(sales_report))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            crate::auth::require_staff,
        ));

    open.merge(protected)
}

// --- auth -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginBody {
    tenant_slug: String,
    username: String,
    password: String,
}

/// Token pair returned by login and refresh.
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
    let tenant = resolve_tenant(&state, &body.tenant_slug).await?;
    let out = state
        .staff_auth
        .login(LoginInput {
            tenant_id: tenant.id,
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
    tenant_slug: String,
    refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(body): Json<RefreshBody>,
) -> Result<Json<TokenPairBody>, ApiError> {
    let tenant = resolve_tenant(&state, &body.tenant_slug).await?;
    let out = state
        .staff_auth
        .refresh(RefreshInput {
            tenant_id: tenant.id,
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
    ctx: StaffContext,
    Json(body): Json<LogoutBody>,
) -> Result<StatusCode, ApiError> {
    state.staff_auth.logout(ctx.tenant_id, body.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- orders ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OrderListQuery {
    #[serde(default)]
    view: OrderView,
    #[serde(default)]
    offset: u64,
    #[serde(default = "crate::routes::default_limit")]
    limit: u64,
}

async fn list_orders(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<PaginatedResult<Order>>, ApiError> {
    let orders = state
        .orders
        .list(
            ctx.tenant_id,
            query.view,
            Pagination {
                offset: query.offset,
                limit: query.limit,
            },
        )
        .await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.get(ctx.tenant_id, id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct CounterOrderBody {
    table_label: Option<String>,
    note: Option<String>,
    items: Vec<CounterOrderLineBody>,
}

#[derive(Debug, Deserialize)]
struct CounterOrderLineBody {
    menu_item_id: Uuid,
    quantity: u32,
    note: Option<String>,
}

async fn place_order(
    State(state): State<AppState>,
    ctx: StaffContext,
    Json(body): Json<CounterOrderBody>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    ctx.require_order_entry()?;
    let order = state
        .orders
        .place(PlaceOrder {
            tenant_id: ctx.tenant_id,
            table_label: body.table_label,
            channel: OrderChannel::Counter,
            placed_by: Some(ctx.user_id),
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
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
struct OrderStatusBody {
    status: OrderStatus,
}

async fn set_order_status(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
    Json(body): Json<OrderStatusBody>,
) -> Result<Json<Order>, ApiError> {
    require_order_status_role(&ctx.role, &body.status)?;
    let order = state
        .orders
        .transition(ctx.tenant_id, id, body.status)
        .await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct ItemStatusBody {
    status: OrderItemStatus,
}

async fn set_item_status(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ItemStatusBody>,
) -> Result<Json<Order>, ApiError> {
    require_item_status_role(&ctx.role, &body.status)?;
    let order = state
        .orders
        .transition_item(ctx.tenant_id, id, item_id, body.status)
        .await?;
    Ok(Json(order))
}

fn require_order_status_role(role: &StaffRole, target: &OrderStatus) -> Result<(), ApiError> {
    if role.may_set_order_status(target) {
        Ok(())
    } else {
        Err(Error::AuthorizationDenied {
            reason: format!("role may not move orders to {target:?}"),
        }
        .into())
    }
}

fn require_item_status_role(role: &StaffRole, target: &OrderItemStatus) -> Result<(), ApiError> {
    if role.may_set_item_status(target) {
        Ok(())
    } else {
        Err(Error::AuthorizationDenied {
            reason: format!("role may not move items to {target:?}"),
        }
        .into())
    }
}

// --- menu -----------------------------------------------------------

async fn list_menu(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<MenuItem>>, ApiError> {
    let menu = state.menu.staff_list(ctx.tenant_id, page.into()).await?;
    Ok(Json(menu))
}

#[derive(Debug, Deserialize)]
struct CreateMenuItemBody {
    name: String,
    description: Option<String>,
    category: Option<String>,
    price_cents: i64,
    available: Option<bool>,
    sort_order: Option<i64>,
}

async fn create_menu_item(
    State(state): State<AppState>,
    ctx: StaffContext,
    Json(body): Json<CreateMenuItemBody>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    ctx.require_manager()?;
    let item = state
        .menu
        .create(CreateMenuItem {
            tenant_id: ctx.tenant_id,
            name: body.name,
            description: body.description,
            category: body.category,
            price_cents: body.price_cents,
            available: body.available,
            sort_order: body.sort_order,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_menu_item(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMenuItem>,
) -> Result<Json<MenuItem>, ApiError> {
    ctx.require_manager()?;
    let item = state.menu.update(ctx.tenant_id, id, body).await?;
    Ok(Json(item))
}

async fn delete_menu_item(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require_manager()?;
    state.menu.delete(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- feedback -------------------------------------------------------

async fn list_feedback(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<Feedback>>, ApiError> {
    ctx.require_manager()?;
    let feedback = state.feedback.list(ctx.tenant_id, page.into()).await?;
    Ok(Json(feedback))
}

// --- access codes ---------------------------------------------------

async fn list_access_codes(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<AccessCode>>, ApiError> {
    ctx.require_manager()?;
    let codes = state.access_codes.list(ctx.tenant_id, page.into()).await?;
    Ok(Json(codes))
}

#[derive(Debug, Deserialize)]
struct MintCodeBody {
    label: Option<String>,
    max_uses: u32,
    expires_at: Option<DateTime<Utc>>,
}

async fn mint_access_code(
    State(state): State<AppState>,
    ctx: StaffContext,
    Json(body): Json<MintCodeBody>,
) -> Result<(StatusCode, Json<AccessCode>), ApiError> {
    ctx.require_manager()?;
    let code = state
        .access_codes
        .mint(MintAccessCode {
            tenant_id: ctx.tenant_id,
            label: body.label,
            max_uses: body.max_uses,
            expires_at: body.expires_at,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(code)))
}

async fn revoke_access_code(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require_manager()?;
    state.access_codes.revoke(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- staff accounts -------------------------------------------------

/// Staff user without the password hash; what management endpoints
/// return.
#[derive(Debug, Serialize)]
struct StaffUserBody {
    id: Uuid,
    username: String,
    display_name: String,
    role: StaffRole,
    status: StaffStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StaffUser> for StaffUserBody {
    fn from(user: StaffUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

async fn list_staff(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResult<StaffUserBody>>, ApiError> {
    ctx.require_owner()?;
    let staff = state.staff.list(ctx.tenant_id, page.into()).await?;
    Ok(Json(PaginatedResult {
        total: staff.total,
        offset: staff.offset,
        limit: staff.limit,
        items: staff.items.into_iter().map(Into::into).collect(),
    }))
}

async fn get_staff(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffUserBody>, ApiError> {
    ctx.require_owner()?;
    let user = state.staff.get(ctx.tenant_id, id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
struct CreateStaffBody {
    username: String,
    display_name: String,
    password: String,
    role: StaffRole,
}

async fn create_staff(
    State(state): State<AppState>,
    ctx: StaffContext,
    Json(body): Json<CreateStaffBody>,
) -> Result<(StatusCode, Json<StaffUserBody>), ApiError> {
    ctx.require_owner()?;
    let user = state
        .staff
        .create(CreateStaffUser {
            tenant_id: ctx.tenant_id,
            username: body.username,
            display_name: body.display_name,
            password: body.password,
            role: body.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn update_staff(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStaffUser>,
) -> Result<Json<StaffUserBody>, ApiError> {
    ctx.require_owner()?;
    let user = state.staff.update(ctx.tenant_id, id, body).await?;
    Ok(Json(user.into()))
}

async fn delete_staff(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require_owner()?;
    state.staff.delete(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SetPasswordBody {
    password: String,
}

async fn set_staff_password(
    State(state): State<AppState>,
    ctx: StaffContext,
    Path(id): Path<Uuid>,
    Json(body): Json<SetPasswordBody>,
) -> Result<StatusCode, ApiError> {
    ctx.require_owner()?;
    state
        .staff
        .set_password(ctx.tenant_id, id, &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- reports --------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SalesQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

async fn sales_report(
    State(state): State<AppState>,
    ctx: StaffContext,
    Query(query): Query<SalesQuery>,
) -> Result<Json<SalesSummary>, ApiError> {
    ctx.require_manager()?;
    let summary = state
        .orders
        .sales_summary(ctx.tenant_id, query.from, query.to)
        .await?;
    Ok(Json(summary))
}
