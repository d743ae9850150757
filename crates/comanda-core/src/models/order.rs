//! Order and order-item domain models.
//!
//! Both orders and their line items move through a forward-only status
//! machine. A transition that is not listed in the matrix is rejected
//! with [`Error::InvalidTransition`](crate::error::Error::InvalidTransition)
//! by the order service; nothing in the system ever rewinds a status.
//!
//! Item name and unit price are captured from the menu at placement time
//! and never re-read, so editing the menu cannot reprice an open order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest and largest quantity accepted for a single line item.
pub const MIN_ITEM_QUANTITY: u32 = 1;
pub const MAX_ITEM_QUANTITY: u32 = 99;

/// How the order entered the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderChannel {
    /// Entered by staff at the till.
    Counter,
    /// Placed by a customer through an access-code session.
    SelfService,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    /// The legal forward transitions. Cancellation is allowed from any
    /// non-terminal status; `Served` and `Cancelled` are terminal.
    pub fn can_transition_to(&self, next: &OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Pending, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, Served)
                | (Ready, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    /// Open orders count against the `max_open_orders` plan limit.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderItemStatus {
    Queued,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderItemStatus {
    /// Same forward-only shape as [`OrderStatus::can_transition_to`].
    pub fn can_transition_to(&self, next: &OrderItemStatus) -> bool {
        use OrderItemStatus::*;
        matches!(
            (self, next),
            (Queued, Preparing)
                | (Queued, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, Served)
                | (Ready, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderItemStatus::Served | OrderItemStatus::Cancelled)
    }

    /// Non-cancelled items count toward the order total.
    pub fn counts_toward_total(&self) -> bool {
        !matches!(self, OrderItemStatus::Cancelled)
    }

    /// Whether the kitchen is done with this item. An order may move to
    /// `Ready` only once every non-cancelled item is prepared.
    pub fn is_prepared(&self) -> bool {
        matches!(self, OrderItemStatus::Ready | OrderItemStatus::Served)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Free-form table/pickup label shown on tickets (e.g. `T4`).
    pub table_label: Option<String>,
    pub status: OrderStatus,
    pub channel: OrderChannel,
    /// Staff user who entered a counter order; `None` for self-service.
    pub placed_by: Option<Uuid>,
    pub note: Option<String>,
    /// Sum of line totals over non-cancelled items, in minor units.
    pub total_cents: i64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Recompute the order total from a set of items.
    pub fn total_from_items(items: &[OrderItem]) -> i64 {
        items
            .iter()
            .filter(|i| i.status.counts_toward_total())
            .map(OrderItem::line_total_cents)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    /// Menu item name as it was at placement time.
    pub name: String,
    pub quantity: u32,
    /// Menu item price as it was at placement time, in minor units.
    pub unit_price_cents: i64,
    pub status: OrderItemStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}

/// Aggregate over served orders in a reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub orders_served: u64,
    pub gross_cents: i64,
    /// Zero when no orders were served in the window.
    pub average_order_cents: i64,
}

/// A fully priced order ready for persistence. Produced by the order
/// service after menu lookup and price capture; the repository stores it
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub tenant_id: Uuid,
    pub table_label: Option<String>,
    pub channel: OrderChannel,
    pub placed_by: Option<Uuid>,
    pub note: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub note: Option<String>,
}

impl CreateOrderItem {
    pub fn line_total_cents(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}
