//! HQ operator domain model.
//!
//! Operators are the super-admins of the platform itself. They are
//! global (no tenant id) and only interact through the `/v1/hq` surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperatorStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HqOperator {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub status: OperatorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHqOperator {
    pub username: String,
    pub display_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
}
