//! Subscription event domain model.
//!
//! Every HQ mutation of a client's plan, status or billing period
//! appends one event. The log is append-only and drives the HQ
//! subscription history view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::client::{ClientStatus, Plan};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum SubscriptionEventKind {
    PlanChanged {
        from: Plan,
        to: Plan,
    },
    StatusChanged {
        from: ClientStatus,
        to: ClientStatus,
    },
    Renewed {
        period_end: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub id: Uuid,
    pub client_id: Uuid,
    pub kind: SubscriptionEventKind,
    /// HQ operator who performed the change.
    pub actor: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionEvent {
    pub client_id: Uuid,
    pub kind: SubscriptionEventKind,
    pub actor: Option<Uuid>,
}
