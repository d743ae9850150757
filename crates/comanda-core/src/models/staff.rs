//! Staff user domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::{OrderItemStatus, OrderStatus};

/// Shortest password accepted when creating or resetting staff
/// credentials.
pub const MIN_PASSWORD_CHARS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StaffRole {
    Owner,
    Manager,
    Cashier,
    Kitchen,
    Waiter,
}

impl StaffRole {
    /// Owner or Manager: may administer the menu, access codes, staff
    /// and read feedback/reports.
    pub fn is_manager(&self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Manager)
    }

    /// Roles allowed to enter counter orders at the till.
    pub fn may_place_orders(&self) -> bool {
        matches!(
            self,
            StaffRole::Owner | StaffRole::Manager | StaffRole::Cashier
        )
    }

    /// Which roles may move an order to a given target status.
    /// Kitchen drives preparation, waiters serve, cashiers cover the
    /// counter flow end to end; managers and owners may do anything.
    pub fn may_set_order_status(&self, target: &OrderStatus) -> bool {
        if self.is_manager() {
            return !matches!(target, OrderStatus::Pending);
        }
        match target {
            OrderStatus::Pending => false,
            OrderStatus::Preparing => matches!(self, StaffRole::Cashier | StaffRole::Kitchen),
            OrderStatus::Ready => matches!(self, StaffRole::Kitchen),
            OrderStatus::Served => matches!(self, StaffRole::Cashier | StaffRole::Waiter),
            OrderStatus::Cancelled => matches!(self, StaffRole::Cashier),
        }
    }

    /// Same rule applied at line-item granularity.
    pub fn may_set_item_status(&self, target: &OrderItemStatus) -> bool {
        if self.is_manager() {
            return !matches!(target, OrderItemStatus::Queued);
        }
        match target {
            OrderItemStatus::Queued => false,
            OrderItemStatus::Preparing => {
                matches!(self, StaffRole::Cashier | StaffRole::Kitchen)
            }
            OrderItemStatus::Ready => matches!(self, StaffRole::Kitchen),
            OrderItemStatus::Served => matches!(self, StaffRole::Cashier | StaffRole::Waiter),
            OrderItemStatus::Cancelled => matches!(self, StaffRole::Cashier),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StaffStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Login name, unique within the tenant.
    pub username: String,
    /// Name shown on tickets and dashboards.
    pub display_name: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub status: StaffStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaffUser {
    pub tenant_id: Uuid,
    pub username: String,
    pub display_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateStaffUser {
    pub display_name: Option<String>,
    pub role: Option<StaffRole>,
    pub status: Option<StaffStatus>,
}
