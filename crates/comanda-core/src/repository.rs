//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter to enforce data isolation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PosResult;
use crate::models::{
    access_code::{AccessCode, CreateAccessCode},
    client::{Client, ClientStatus, CreateClient, Plan, UpdateClient},
    entitlement::EntitlementSnapshot,
    feedback::{CreateFeedback, Feedback},
    hq::{CreateHqOperator, HqOperator},
    menu::{CreateMenuItem, MenuItem, UpdateMenuItem},
    order::{CreateOrder, Order, OrderItemStatus, OrderStatus, SalesSummary},
    session::{CreateSession, Session},
    staff::{CreateStaffUser, StaffUser, UpdateStaffUser},
    subscription::{CreateSubscriptionEvent, SubscriptionEvent},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Query filter for order listings. `None` statuses means all.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Option<Vec<OrderStatus>>,
}

// ---------------------------------------------------------------------------
// Global scope: clients (tenant roots) and HQ operators
// ---------------------------------------------------------------------------

pub trait ClientRepository: Send + Sync {
    fn create(&self, input: CreateClient) -> impl Future<Output = PosResult<Client>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PosResult<Client>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = PosResult<Client>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateClient,
    ) -> impl Future<Output = PosResult<Client>> + Send;
    fn set_plan(&self, id: Uuid, plan: Plan) -> impl Future<Output = PosResult<Client>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: ClientStatus,
    ) -> impl Future<Output = PosResult<Client>> + Send;
    /// Extend the billing period.
    fn renew(
        &self,
        id: Uuid,
        period_end: DateTime<Utc>,
    ) -> impl Future<Output = PosResult<Client>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<Client>>> + Send;
}

pub trait HqOperatorRepository: Send + Sync {
    fn create(
        &self,
        input: CreateHqOperator,
    ) -> impl Future<Output = PosResult<HqOperator>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PosResult<HqOperator>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = PosResult<HqOperator>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait StaffRepository: Send + Sync {
    fn create(&self, input: CreateStaffUser) -> impl Future<Output = PosResult<StaffUser>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = PosResult<StaffUser>> + Send;
    fn get_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> impl Future<Output = PosResult<StaffUser>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateStaffUser,
    ) -> impl Future<Output = PosResult<StaffUser>> + Send;
    /// Replace the password hash (owner-driven reset).
    fn set_password(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = PosResult<()>> + Send;
    /// Soft-delete: sets status to Suspended.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = PosResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<StaffUser>>> + Send;
    /// Active staff only; suspended accounts do not count against the
    /// staff limit.
    fn count_active(&self, tenant_id: Uuid) -> impl Future<Output = PosResult<u64>> + Send;
}

pub trait MenuItemRepository: Send + Sync {
    fn create(&self, input: CreateMenuItem) -> impl Future<Output = PosResult<MenuItem>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = PosResult<MenuItem>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateMenuItem,
    ) -> impl Future<Output = PosResult<MenuItem>> + Send;
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = PosResult<()>> + Send;
    /// Ordered by category, then `sort_order`. Customers get
    /// `include_unavailable = false`.
    fn list(
        &self,
        tenant_id: Uuid,
        include_unavailable: bool,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<MenuItem>>> + Send;
    fn count(&self, tenant_id: Uuid) -> impl Future<Output = PosResult<u64>> + Send;
}

pub trait OrderRepository: Send + Sync {
    /// Persists the order together with all of its items.
    fn create(&self, input: CreateOrder) -> impl Future<Output = PosResult<Order>> + Send;
    /// Returns the order with its items loaded.
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = PosResult<Order>> + Send;
    /// Oldest first, so dashboards read top-down.
    fn list(
        &self,
        tenant_id: Uuid,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<Order>>> + Send;
    fn count_open(&self, tenant_id: Uuid) -> impl Future<Output = PosResult<u64>> + Send;
    /// Persist an order status already validated by the order service.
    fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: OrderStatus,
    ) -> impl Future<Output = PosResult<()>> + Send;
    fn set_item_status(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        item_id: Uuid,
        status: OrderItemStatus,
    ) -> impl Future<Output = PosResult<()>> + Send;
    fn set_total(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        total_cents: i64,
    ) -> impl Future<Output = PosResult<()>> + Send;
    /// Cancel every item of the order that is not already terminal.
    fn cancel_active_items(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> impl Future<Output = PosResult<()>> + Send;
    /// Aggregates served orders inside the window.
    fn sales_summary(
        &self,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = PosResult<SalesSummary>> + Send;
}

pub trait FeedbackRepository: Send + Sync {
    fn create(&self, input: CreateFeedback) -> impl Future<Output = PosResult<Feedback>> + Send;
    /// Newest first.
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<Feedback>>> + Send;
}

pub trait AccessCodeRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAccessCode,
    ) -> impl Future<Output = PosResult<AccessCode>> + Send;
    fn get_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> impl Future<Output = PosResult<AccessCode>> + Send;
    /// Atomically bump `use_count` if and only if the code is currently
    /// redeemable. `NotFound` when it is not.
    fn redeem(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> impl Future<Output = PosResult<AccessCode>> + Send;
    fn revoke(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = PosResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<AccessCode>>> + Send;
}

// ---------------------------------------------------------------------------
// Subscription history & entitlement snapshots
// ---------------------------------------------------------------------------

pub trait SubscriptionEventRepository: Send + Sync {
    /// Append-only; events are never updated or deleted.
    fn append(
        &self,
        input: CreateSubscriptionEvent,
    ) -> impl Future<Output = PosResult<SubscriptionEvent>> + Send;
    /// Newest first.
    fn list_by_client(
        &self,
        client_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PosResult<PaginatedResult<SubscriptionEvent>>> + Send;
}

pub trait SnapshotRepository: Send + Sync {
    /// Insert or refresh the single snapshot row of a tenant.
    fn upsert(&self, snapshot: EntitlementSnapshot) -> impl Future<Output = PosResult<()>> + Send;
    fn get(&self, tenant_id: Uuid) -> impl Future<Output = PosResult<EntitlementSnapshot>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = PosResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        tenant_id: Uuid,
        token_hash: &str,
    ) -> impl Future<Output = PosResult<Session>> + Send;
    /// Invalidate a single session.
    fn invalidate(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = PosResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g. on suspension).
    fn invalidate_user_sessions(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = PosResult<()>> + Send;
    /// Remove all expired sessions.
    fn cleanup_expired(&self, tenant_id: Uuid) -> impl Future<Output = PosResult<u64>> + Send;
}
