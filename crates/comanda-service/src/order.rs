//! Order placement and lifecycle.
//!
//! The service validates everything the repository assumes: entitlement
//! gates, the open-order limit, the forward-only status matrices and
//! the cross-entity rules tying an order to its line items. The
//! repository persists transitions only after they were validated here.

use chrono::{DateTime, Utc};
use comanda_core::error::{Error, PosResult};
use comanda_core::models::entitlement::{ActionClass, Feature, LimitKind};
use comanda_core::models::order::{
    CreateOrder, CreateOrderItem, MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY, Order, OrderChannel,
    OrderItemStatus, OrderStatus, SalesSummary,
};
use comanda_core::repository::{
    MenuItemRepository, OrderFilter, OrderRepository, PaginatedResult, Pagination,
};
use comanda_entitle::EntitlementCheck;
use serde::Deserialize;
use uuid::Uuid;

/// One requested line of a new order, before menu lookup.
#[derive(Debug, Clone)]
pub struct PlaceOrderLine {
    pub menu_item_id: Uuid,
    pub quantity: u32,
    pub note: Option<String>,
}

/// Input for order placement. Names and prices are captured from the
/// menu by the service, never taken from the caller.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub tenant_id: Uuid,
    pub table_label: Option<String>,
    pub channel: OrderChannel,
    /// Staff user entering a counter order; `None` for self-service.
    pub placed_by: Option<Uuid>,
    pub note: Option<String>,
    pub items: Vec<PlaceOrderLine>,
}

/// Dashboard views over the order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderView {
    /// Everything still in flight.
    #[default]
    Open,
    /// Kitchen queue: orders waiting to be cooked or being cooked.
    Kitchen,
    /// Waiter board: orders ready to bring out.
    Waiter,
    /// No status filter.
    All,
}

impl OrderView {
    fn filter(&self) -> OrderFilter {
        let statuses = match self {
            OrderView::Open => Some(vec![
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Ready,
            ]),
            OrderView::Kitchen => Some(vec![OrderStatus::Pending, OrderStatus::Preparing]),
            OrderView::Waiter => Some(vec![OrderStatus::Ready]),
            OrderView::All => None,
        };
        OrderFilter { statuses }
    }
}

pub struct OrderService<R: OrderRepository, M: MenuItemRepository, E: EntitlementCheck> {
    orders: R,
    menu: M,
    entitlements: E,
}

impl<R: OrderRepository, M: MenuItemRepository, E: EntitlementCheck> OrderService<R, M, E> {
    pub fn new(orders: R, menu: M, entitlements: E) -> Self {
        Self {
            orders,
            menu,
            entitlements,
        }
    }

    /// Place a new order: gate, price and persist it.
    pub async fn place(&self, input: PlaceOrder) -> PosResult<Order> {
        // 1. Shape validation before any I/O.
        if input.items.is_empty() {
            return Err(Error::Validation {
                message: "order has no items".into(),
            });
        }
        for line in &input.items {
            if line.quantity < MIN_ITEM_QUANTITY || line.quantity > MAX_ITEM_QUANTITY {
                return Err(Error::Validation {
                    message: format!(
                        "item quantity must be between {MIN_ITEM_QUANTITY} and \
                         {MAX_ITEM_QUANTITY}, got {}",
                        line.quantity
                    ),
                });
            }
        }

        // 2. Entitlement gate. Self-service ordering is a plan feature;
        //    counter orders only need a live subscription.
        match &input.channel {
            OrderChannel::SelfService => {
                self.entitlements
                    .check_feature(
                        input.tenant_id,
                        Feature::OnlineOrdering,
                        ActionClass::Operational,
                    )
                    .await?
            }
            OrderChannel::Counter => {
                self.entitlements
                    .require_active(input.tenant_id, ActionClass::Operational)
                    .await?
            }
        }

        // 3. Open-order limit.
        let open = self.orders.count_open(input.tenant_id).await?;
        self.entitlements
            .check_limit(input.tenant_id, LimitKind::MaxOpenOrders, open)
            .await?;

        // 4. Resolve menu items, capturing name and price as they are
        //    right now.
        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let menu_item = self
                .menu
                .get_by_id(input.tenant_id, line.menu_item_id)
                .await?;
            if !menu_item.available {
                return Err(Error::Validation {
                    message: format!("menu item '{}' is not available", menu_item.name),
                });
            }
            items.push(CreateOrderItem {
                menu_item_id: menu_item.id,
                name: menu_item.name,
                quantity: line.quantity,
                unit_price_cents: menu_item.price_cents,
                note: line.note.clone(),
            });
        }

        // 5. Persist the order and its items together.
        self.orders
            .create(CreateOrder {
                tenant_id: input.tenant_id,
                table_label: input.table_label,
                channel: input.channel,
                placed_by: input.placed_by,
                note: input.note,
                items,
            })
            .await
    }

    /// Load one order with its items.
    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> PosResult<Order> {
        self.orders.get_by_id(tenant_id, id).await
    }

    /// List orders for a dashboard view, oldest first. The kitchen and
    /// waiter views are plan features.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        view: OrderView,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<Order>> {
        match view {
            OrderView::Kitchen => {
                self.entitlements
                    .check_feature(tenant_id, Feature::KitchenDisplay, ActionClass::Operational)
                    .await?
            }
            OrderView::Waiter => {
                self.entitlements
                    .check_feature(tenant_id, Feature::WaiterBoard, ActionClass::Operational)
                    .await?
            }
            OrderView::Open | OrderView::All => {}
        }
        self.orders.list(tenant_id, view.filter(), pagination).await
    }

    /// Move an order to a new status.
    ///
    /// `Ready` requires every non-cancelled item to be prepared.
    /// `Cancelled` cascades to all still-active items and re-prices the
    /// order from the survivors.
    pub async fn transition(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> PosResult<Order> {
        let order = self.orders.get_by_id(tenant_id, order_id).await?;

        if !order.status.can_transition_to(&new_status) {
            return Err(Error::InvalidTransition {
                entity: "order",
                from: format!("{:?}", order.status),
                to: format!("{new_status:?}"),
            });
        }

        if new_status == OrderStatus::Ready {
            let unprepared = order
                .items
                .iter()
                .filter(|i| i.status.counts_toward_total() && !i.status.is_prepared())
                .count();
            if unprepared > 0 {
                return Err(Error::Validation {
                    message: format!("{unprepared} item(s) are not prepared yet"),
                });
            }
        }

        let cancelling = new_status == OrderStatus::Cancelled;
        if cancelling {
            self.orders.cancel_active_items(tenant_id, order_id).await?;
        }
        self.orders
            .set_status(tenant_id, order_id, new_status)
            .await?;

        let mut updated = self.orders.get_by_id(tenant_id, order_id).await?;
        if cancelling {
            // Re-price from the surviving (already served) items.
            let total = Order::total_from_items(&updated.items);
            if total != updated.total_cents {
                self.orders.set_total(tenant_id, order_id, total).await?;
                updated.total_cents = total;
            }
        }
        Ok(updated)
    }

    /// Move a single line item to a new status.
    ///
    /// Cancelling an item re-prices the order; the order itself is
    /// cancelled only when every item ends up cancelled. An order with
    /// a served item stays open so the served food is still billed.
    pub async fn transition_item(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        item_id: Uuid,
        new_status: OrderItemStatus,
    ) -> PosResult<Order> {
        let order = self.orders.get_by_id(tenant_id, order_id).await?;
        let item = order
            .items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| Error::NotFound {
                entity: "order_item",
                id: item_id.to_string(),
            })?;

        if !item.status.can_transition_to(&new_status) {
            return Err(Error::InvalidTransition {
                entity: "order_item",
                from: format!("{:?}", item.status),
                to: format!("{new_status:?}"),
            });
        }

        let cancelling = new_status == OrderItemStatus::Cancelled;
        self.orders
            .set_item_status(tenant_id, order_id, item_id, new_status)
            .await?;

        let mut updated = self.orders.get_by_id(tenant_id, order_id).await?;
        if cancelling {
            let total = Order::total_from_items(&updated.items);
            if total != updated.total_cents {
                self.orders.set_total(tenant_id, order_id, total).await?;
                updated.total_cents = total;
            }
            let all_cancelled = updated
                .items
                .iter()
                .all(|i| i.status == OrderItemStatus::Cancelled);
            if all_cancelled && !updated.status.is_terminal() {
                self.orders
                    .set_status(tenant_id, order_id, OrderStatus::Cancelled)
                    .await?;
                updated.status = OrderStatus::Cancelled;
            }
        }
        Ok(updated)
    }

    /// Aggregate served orders in a reporting window. Plan-gated.
    pub async fn sales_summary(
        &self,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PosResult<SalesSummary> {
        if from >= to {
            return Err(Error::Validation {
                message: "reporting window is empty".into(),
            });
        }
        self.entitlements
            .check_feature(tenant_id, Feature::SalesReports, ActionClass::Operational)
            .await?;
        self.orders.sales_summary(tenant_id, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_map_to_the_expected_status_sets() {
        assert_eq!(
            OrderView::Open.filter().statuses,
            Some(vec![
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Ready,
            ])
        );
        assert_eq!(
            OrderView::Kitchen.filter().statuses,
            Some(vec![OrderStatus::Pending, OrderStatus::Preparing])
        );
        assert_eq!(
            OrderView::Waiter.filter().statuses,
            Some(vec![OrderStatus::Ready])
        );
        assert!(OrderView::All.filter().statuses.is_none());
    }

    #[test]
    fn default_view_is_open() {
        assert_eq!(OrderView::default(), OrderView::Open);
    }
}
