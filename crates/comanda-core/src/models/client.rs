//! Client (tenant) domain model.
//!
//! A client is a single restaurant/business account and the root of
//! multi-tenancy: every other domain entity is scoped to a client id.
//! Clients are managed exclusively through the HQ surface, which is the
//! authority for plan and subscription status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan tier. Feature and limit tables keyed by plan live
/// in [`crate::models::entitlement`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Plan {
    Starter,
    Standard,
    Premium,
}

/// Subscription lifecycle status of a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientStatus {
    Trial,
    Active,
    PastDue,
    Suspended,
    Cancelled,
}

impl ClientStatus {
    /// Whether plan-gated actions must be refused outright for a client
    /// in this status. `PastDue` still serves (grace period); `Trial`
    /// serves until it is flipped by HQ.
    pub fn blocks_gated_actions(&self) -> bool {
        matches!(self, ClientStatus::Suspended | ClientStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    /// Display name of the restaurant.
    pub name: String,
    /// URL-safe unique identifier, used as the public tenant path segment
    /// (e.g. `trattoria-da-mario`). Immutable after creation: printed QR
    /// codes embed it.
    pub slug: String,
    pub plan: Plan,
    pub status: ClientStatus,
    pub contact_email: String,
    /// ISO 4217 code used for menu prices (prices themselves are integer
    /// minor units).
    pub currency: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new client. New clients start in
/// `Trial` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub slug: String,
    pub plan: Plan,
    pub contact_email: String,
    /// Defaults to `EUR` when omitted.
    pub currency: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing client. Plan, status and
/// period end are changed through dedicated operations so that every
/// change leaves a subscription event behind.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub currency: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
