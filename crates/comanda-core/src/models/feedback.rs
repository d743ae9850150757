//! Customer feedback domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted feedback comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// Ratings are stars, inclusive.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Append-only: feedback is never edited or deleted once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Submitted from an order-status page when present.
    pub order_id: Option<Uuid>,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedback {
    pub tenant_id: Uuid,
    pub order_id: Option<Uuid>,
    pub rating: u8,
    pub comment: Option<String>,
}
