//! Entitlements: the static plan tables and the per-tenant snapshot.
//!
//! Features and limits are a pure function of [`Plan`], so the snapshot
//! persists only the plan and subscription status it last saw at the
//! authority, plus when it saw them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::client::{ClientStatus, Plan};

/// A snapshot older than this may still authorize operational actions
/// (taking orders, redeeming codes) but must refuse administrative ones.
pub const SNAPSHOT_MAX_AGE_HOURS: i64 = 24;

/// Plan-gated product features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Feature {
    OnlineOrdering,
    Feedback,
    AccessCodes,
    KitchenDisplay,
    WaiterBoard,
    SalesReports,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::OnlineOrdering,
        Feature::Feedback,
        Feature::AccessCodes,
        Feature::KitchenDisplay,
        Feature::WaiterBoard,
        Feature::SalesReports,
    ];

    pub fn available_on(&self, plan: &Plan) -> bool {
        match self {
            Feature::OnlineOrdering => true,
            Feature::Feedback | Feature::AccessCodes | Feature::KitchenDisplay => {
                !matches!(plan, Plan::Starter)
            }
            Feature::WaiterBoard | Feature::SalesReports => matches!(plan, Plan::Premium),
        }
    }
}

/// Countable plan limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LimitKind {
    MaxStaff,
    MaxMenuItems,
    MaxOpenOrders,
}

impl LimitKind {
    /// The action class of the operation each limit guards: staff and
    /// menu are configured by managers, orders accumulate during
    /// service.
    pub fn action_class(&self) -> ActionClass {
        match self {
            LimitKind::MaxStaff | LimitKind::MaxMenuItems => ActionClass::Administrative,
            LimitKind::MaxOpenOrders => ActionClass::Operational,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_staff: u64,
    pub max_menu_items: u64,
    pub max_open_orders: u64,
}

impl PlanLimits {
    pub fn for_plan(plan: &Plan) -> Self {
        match plan {
            Plan::Starter => Self {
                max_staff: 3,
                max_menu_items: 30,
                max_open_orders: 20,
            },
            Plan::Standard => Self {
                max_staff: 10,
                max_menu_items: 200,
                max_open_orders: 100,
            },
            Plan::Premium => Self {
                max_staff: 50,
                max_menu_items: 1000,
                max_open_orders: 500,
            },
        }
    }

    pub fn get(&self, kind: &LimitKind) -> u64 {
        match kind {
            LimitKind::MaxStaff => self.max_staff,
            LimitKind::MaxMenuItems => self.max_menu_items,
            LimitKind::MaxOpenOrders => self.max_open_orders,
        }
    }
}

/// Whether an action is part of day-to-day service or of configuring
/// the business. A stale snapshot keeps service running but blocks
/// configuration until the authority is reachable again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionClass {
    /// Order flow, code redemption, feedback intake.
    Operational,
    /// Menu edits, staff management, access-code minting.
    Administrative,
}

/// Per-tenant cache of the last answer from the entitlement authority
/// (the HQ client record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementSnapshot {
    pub tenant_id: Uuid,
    pub plan: Plan,
    pub status: ClientStatus,
    pub refreshed_at: DateTime<Utc>,
}

impl EntitlementSnapshot {
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.refreshed_at).num_hours()
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age_hours(now) > SNAPSHOT_MAX_AGE_HOURS
    }
}

/// The resolved entitlements of a tenant, as served by the entitlement
/// service and the HQ debug endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlements {
    pub plan: Plan,
    pub status: ClientStatus,
    pub features: Vec<Feature>,
    pub limits: PlanLimits,
}

impl Entitlements {
    pub fn for_plan(plan: Plan, status: ClientStatus) -> Self {
        let features = Feature::ALL
            .iter()
            .filter(|f| f.available_on(&plan))
            .cloned()
            .collect();
        let limits = PlanLimits::for_plan(&plan);
        Self {
            plan,
            status,
            features,
            limits,
        }
    }

    pub fn has_feature(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }
}
