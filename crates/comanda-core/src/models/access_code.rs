//! Access code domain model.
//!
//! Access codes open customer self-service ordering sessions: staff
//! print or display a code for a table, the customer enters it on the
//! menu page, and a successful redemption authorizes order placement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Code alphabet: uppercase letters and digits with the ambiguous
/// `0`, `O`, `1`, `I` removed.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCode {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// The printable code string, unique within the tenant.
    pub code: String,
    /// Staff-facing label (e.g. `Table 4`).
    pub label: Option<String>,
    pub max_uses: u32,
    pub use_count: u32,
    pub revoked: bool,
    /// `None` means the code never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessCode {
    /// Whether a redemption at `now` would succeed. The repository
    /// enforces the same conditions atomically; this is for display and
    /// tests.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked
            && self.use_count < self.max_uses
            && self.expires_at.is_none_or(|e| e > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccessCode {
    pub tenant_id: Uuid,
    /// Generated server-side by the access-code service; never
    /// client-supplied.
    pub code: String,
    pub label: Option<String>,
    pub max_uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
}
