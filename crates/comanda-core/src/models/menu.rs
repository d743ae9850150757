//! Menu item domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Free-form section label (e.g. `Antipasti`). Menus are grouped by
    /// this client-side.
    pub category: Option<String>,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// Unavailable items stay on the staff menu but are hidden from
    /// customers and cannot be ordered.
    pub available: bool,
    /// Display ordering within a category, ascending.
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMenuItem {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    /// Defaults to `true` when omitted.
    pub available: Option<bool>,
    /// Defaults to `0` when omitted.
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMenuItem {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub available: Option<bool>,
    pub sort_order: Option<i64>,
}
