//! SurrealDB implementation of [`OrderRepository`].
//!
//! Orders live in the `orders` table (`order` is a reserved word in
//! SurrealQL) with their line items in `order_item`, keyed back by
//! `order_id`. Reads always return the order with its items loaded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::order::{
    CreateOrder, Order, OrderChannel, OrderItem, OrderItemStatus, OrderStatus, SalesSummary,
};
use comanda_core::repository::{OrderFilter, OrderRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OrderRow {
    tenant_id: String,
    table_label: Option<String>,
    status: String,
    channel: String,
    placed_by: Option<String>,
    note: Option<String>,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrderRowWithId {
    record_id: String,
    tenant_id: String,
    table_label: Option<String>,
    status: String,
    channel: String,
    placed_by: Option<String>,
    note: Option<String>,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrderItemRow {
    tenant_id: String,
    order_id: String,
    menu_item_id: String,
    name: String,
    quantity: u32,
    unit_price_cents: i64,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrderItemRowWithId {
    record_id: String,
    tenant_id: String,
    order_id: String,
    menu_item_id: String,
    name: String,
    quantity: u32,
    unit_price_cents: i64,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_order_status(s: &str) -> Result<OrderStatus, DbError> {
    match s {
        "Pending" => Ok(OrderStatus::Pending),
        "Preparing" => Ok(OrderStatus::Preparing),
        "Ready" => Ok(OrderStatus::Ready),
        "Served" => Ok(OrderStatus::Served),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(DbError::Decode(format!("unknown order status: {other}"))),
    }
}

fn order_status_to_str(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Pending",
        OrderStatus::Preparing => "Preparing",
        OrderStatus::Ready => "Ready",
        OrderStatus::Served => "Served",
        OrderStatus::Cancelled => "Cancelled",
    }
}

fn parse_item_status(s: &str) -> Result<OrderItemStatus, DbError> {
    match s {
        "Queued" => Ok(OrderItemStatus::Queued),
        "Preparing" => Ok(OrderItemStatus::Preparing),
        "Ready" => Ok(OrderItemStatus::Ready),
        "Served" => Ok(OrderItemStatus::Served),
        "Cancelled" => Ok(OrderItemStatus::Cancelled),
        other => Err(DbError::Decode(format!(
            "unknown order item status: {other}"
        ))),
    }
}

fn item_status_to_str(status: &OrderItemStatus) -> &'static str {
    match status {
        OrderItemStatus::Queued => "Queued",
        OrderItemStatus::Preparing => "Preparing",
        OrderItemStatus::Ready => "Ready",
        OrderItemStatus::Served => "Served",
        OrderItemStatus::Cancelled => "Cancelled",
    }
}

fn parse_channel(s: &str) -> Result<OrderChannel, DbError> {
    match s {
        "Counter" => Ok(OrderChannel::Counter),
        "SelfService" => Ok(OrderChannel::SelfService),
        other => Err(DbError::Decode(format!("unknown order channel: {other}"))),
    }
}

fn channel_to_str(channel: &OrderChannel) -> &'static str {
    match channel {
        OrderChannel::Counter => "Counter",
        OrderChannel::SelfService => "SelfService",
    }
}

fn parse_opt_uuid(s: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
    })
    .transpose()
}

impl OrderRow {
    fn into_order(self, id: Uuid, items: Vec<OrderItem>) -> Result<Order, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(Order {
            id,
            tenant_id,
            table_label: self.table_label,
            status: parse_order_status(&self.status)?,
            channel: parse_channel(&self.channel)?,
            placed_by: parse_opt_uuid(self.placed_by, "placed_by")?,
            note: self.note,
            total_cents: self.total_cents,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderRowWithId {
    fn try_into_order(self, items: Vec<OrderItem>) -> Result<Order, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(Order {
            id,
            tenant_id,
            table_label: self.table_label,
            status: parse_order_status(&self.status)?,
            channel: parse_channel(&self.channel)?,
            placed_by: parse_opt_uuid(self.placed_by, "placed_by")?,
            note: self.note,
            total_cents: self.total_cents,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderItemRow {
    fn into_item(self, id: Uuid) -> Result<OrderItem, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let order_id = Uuid::parse_str(&self.order_id)
            .map_err(|e| DbError::Decode(format!("invalid order UUID: {e}")))?;
        let menu_item_id = Uuid::parse_str(&self.menu_item_id)
            .map_err(|e| DbError::Decode(format!("invalid menu item UUID: {e}")))?;
        Ok(OrderItem {
            id,
            tenant_id,
            order_id,
            menu_item_id,
            name: self.name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            status: parse_item_status(&self.status)?,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderItemRowWithId {
    fn try_into_item(self) -> Result<OrderItem, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let order_id = Uuid::parse_str(&self.order_id)
            .map_err(|e| DbError::Decode(format!("invalid order UUID: {e}")))?;
        let menu_item_id = Uuid::parse_str(&self.menu_item_id)
            .map_err(|e| DbError::Decode(format!("invalid menu item UUID: {e}")))?;
        Ok(OrderItem {
            id,
            tenant_id,
            order_id,
            menu_item_id,
            name: self.name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            status: parse_item_status(&self.status)?,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct SummaryRow {
    orders_served: u64,
    gross_cents: i64,
}

/// SurrealDB implementation of the Order repository.
#[derive(Clone)]
pub struct SurrealOrderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fetch the items of a set of orders and group them by order.
    async fn load_items(
        &self,
        tenant_id: &str,
        order_ids: &[String],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, DbError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Order IDs are server-generated UUIDs, safe to interpolate.
        let id_list = order_ids
            .iter()
            .map(|id| format!("'{id}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM order_item \
             WHERE tenant_id = $tenant_id AND order_id IN [{id_list}] \
             ORDER BY created_at ASC"
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;

        let rows: Vec<OrderItemRowWithId> = result.take(0)?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = row.try_into_item()?;
            by_order.entry(item.order_id).or_default().push(item);
        }
        Ok(by_order)
    }
}

impl<C: Connection> OrderRepository for SurrealOrderRepository<C> {
    async fn create(&self, input: CreateOrder) -> PosResult<Order> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // All items count at placement time; none can be cancelled yet.
        let total_cents: i64 = input.items.iter().map(|i| i.line_total_cents()).sum();

        // One transactional round trip for the order and all of its
        // items: a failed item CREATE cancels the whole batch, so no
        // orphan Pending order can ever reach the kitchen queue or
        // count against the open-order limit.
        let mut sql = String::from(
            "BEGIN TRANSACTION; \
             CREATE type::record('orders', $id) SET \
             tenant_id = $tenant_id, \
             table_label = $table_label, \
             status = 'Pending', \
             channel = $channel, \
             placed_by = $placed_by, \
             note = $note, \
             total_cents = $total_cents; ",
        );
        for i in 0..input.items.len() {
            sql.push_str(&format!(
                "CREATE type::record('order_item', $item_id_{i}) SET \
                 tenant_id = $tenant_id, \
                 order_id = $id, \
                 menu_item_id = $menu_item_id_{i}, \
                 name = $name_{i}, \
                 quantity = $quantity_{i}, \
                 unit_price_cents = $unit_price_cents_{i}, \
                 status = 'Queued', \
                 note = $item_note_{i}; "
            ));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let item_ids: Vec<Uuid> = input.items.iter().map(|_| Uuid::new_v4()).collect();

        let mut query = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("table_label", input.table_label))
            .bind(("channel", channel_to_str(&input.channel).to_string()))
            .bind(("placed_by", input.placed_by.map(|u| u.to_string())))
            .bind(("note", input.note))
            .bind(("total_cents", total_cents));
        for (i, (item, item_id)) in input.items.into_iter().zip(&item_ids).enumerate() {
            query = query
                .bind((format!("item_id_{i}"), item_id.to_string()))
                .bind((format!("menu_item_id_{i}"), item.menu_item_id.to_string()))
                .bind((format!("name_{i}"), item.name))
                .bind((format!("quantity_{i}"), item.quantity))
                .bind((format!("unit_price_cents_{i}"), item.unit_price_cents))
                .bind((format!("item_note_{i}"), item.note));
        }

        let result = query.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        // The BEGIN statement occupies response slot 0, so the order
        // CREATE lands at slot 1 and items follow from slot 2.
        let rows: Vec<OrderRow> = result.take(1).map_err(DbError::from)?;
        let order_row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "order",
            id: id_str,
        })?;

        let mut items = Vec::with_capacity(item_ids.len());
        for (i, item_id) in item_ids.into_iter().enumerate() {
            let rows: Vec<OrderItemRow> = result.take(i + 2).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or(DbError::NotFound {
                entity: "order_item",
                id: item_id.to_string(),
            })?;
            items.push(row.into_item(item_id)?);
        }

        Ok(order_row.into_order(id, items)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> PosResult<Order> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('orders', $id) \
                 WHERE tenant_id = $tenant_id; \
                 SELECT meta::id(id) AS record_id, * FROM order_item \
                 WHERE tenant_id = $tenant_id AND order_id = $id \
                 ORDER BY created_at ASC;",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let order_row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "order",
            id: id_str,
        })?;

        let item_rows: Vec<OrderItemRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = item_rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(order_row.into_order(id, items)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<Order>> {
        let tenant_id_str = tenant_id.to_string();

        // Status names are enum-derived literals, safe to interpolate.
        let status_clause = match &filter.statuses {
            Some(statuses) => {
                let list = statuses
                    .iter()
                    .map(|s| format!("'{}'", order_status_to_str(s)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(" AND status IN [{list}]")
            }
            None => String::new(),
        };

        let count_query = format!(
            "SELECT count() AS total FROM orders \
             WHERE tenant_id = $tenant_id{status_clause} GROUP ALL"
        );
        let mut count_result = self
            .db
            .query(&count_query)
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM orders \
             WHERE tenant_id = $tenant_id{status_clause} \
             ORDER BY created_at ASC \
             LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&page_query)
            .bind(("tenant_id", tenant_id_str.clone()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;

        let order_ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut items_by_order = self.load_items(&tenant_id_str, &order_ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let order_id = Uuid::parse_str(&row.record_id)
                    .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
                let order_items = items_by_order.remove(&order_id).unwrap_or_default();
                row.try_into_order(order_items)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_open(&self, tenant_id: Uuid) -> PosResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM orders \
                 WHERE tenant_id = $tenant_id \
                 AND status IN ['Pending', 'Preparing', 'Ready'] \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn set_status(&self, tenant_id: Uuid, id: Uuid, status: OrderStatus) -> PosResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('orders', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", order_status_to_str(&status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "order",
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn set_item_status(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        item_id: Uuid,
        status: OrderItemStatus,
    ) -> PosResult<()> {
        let item_id_str = item_id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('order_item', $item_id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND order_id = $order_id",
            )
            .bind(("item_id", item_id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("order_id", order_id.to_string()))
            .bind(("status", item_status_to_str(&status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<OrderItemRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "order_item",
                id: item_id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn set_total(&self, tenant_id: Uuid, id: Uuid, total_cents: i64) -> PosResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('orders', $id) SET \
                 total_cents = $total_cents, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("total_cents", total_cents))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "order",
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn cancel_active_items(&self, tenant_id: Uuid, order_id: Uuid) -> PosResult<()> {
        self.db
            .query(
                "UPDATE order_item SET \
                 status = 'Cancelled', updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND order_id = $order_id \
                 AND status IN ['Queued', 'Preparing', 'Ready']",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("order_id", order_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn sales_summary(
        &self,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PosResult<SalesSummary> {
        // Orders fall into the window by the time they were served, which
        // is the last status write.
        let mut result = self
            .db
            .query(
                "SELECT count() AS orders_served, \
                 math::sum(total_cents) AS gross_cents FROM orders \
                 WHERE tenant_id = $tenant_id AND status = 'Served' \
                 AND updated_at >= $from AND updated_at < $to \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SummaryRow> = result.take(0).map_err(DbError::from)?;
        let (orders_served, gross_cents) = rows
            .first()
            .map(|r| (r.orders_served, r.gross_cents))
            .unwrap_or((0, 0));

        let average_order_cents = if orders_served > 0 {
            gross_cents / orders_served as i64
        } else {
            0
        };

        Ok(SalesSummary {
            from,
            to,
            orders_served,
            gross_cents,
            average_order_cents,
        })
    }
}
