//! SurrealDB implementation of [`MenuItemRepository`].

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use comanda_core::repository::{MenuItemRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MenuItemRow {
    tenant_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price_cents: i64,
    available: bool,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MenuItemRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price_cents: i64,
    available: bool,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MenuItemRow {
    fn into_menu_item(self, id: Uuid) -> Result<MenuItem, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(MenuItem {
            id,
            tenant_id,
            name: self.name,
            description: self.description,
            category: self.category,
            price_cents: self.price_cents,
            available: self.available,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl MenuItemRowWithId {
    fn try_into_menu_item(self) -> Result<MenuItem, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(MenuItem {
            id,
            tenant_id,
            name: self.name,
            description: self.description,
            category: self.category,
            price_cents: self.price_cents,
            available: self.available,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the menu item repository.
#[derive(Clone)]
pub struct SurrealMenuItemRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMenuItemRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MenuItemRepository for SurrealMenuItemRepository<C> {
    async fn create(&self, input: CreateMenuItem) -> PosResult<MenuItem> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('menu_item', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, \
                 description = $description, \
                 category = $category, \
                 price_cents = $price_cents, \
                 available = $available, \
                 sort_order = $sort_order",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("category", input.category))
            .bind(("price_cents", input.price_cents))
            .bind(("available", input.available.unwrap_or(true)))
            .bind(("sort_order", input.sort_order.unwrap_or(0)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<MenuItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "menu_item",
            id: id_str,
        })?;

        Ok(row.into_menu_item(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> PosResult<MenuItem> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('menu_item', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MenuItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "menu_item",
            id: id_str,
        })?;

        Ok(row.into_menu_item(id)?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateMenuItem,
    ) -> PosResult<MenuItem> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.price_cents.is_some() {
            sets.push("price_cents = $price_cents");
        }
        if input.available.is_some() {
            sets.push("available = $available");
        }
        if input.sort_order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('menu_item', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            // Some(None) clears the field.
            builder = builder.bind(("description", description));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(price_cents) = input.price_cents {
            builder = builder.bind(("price_cents", price_cents));
        }
        if let Some(available) = input.available {
            builder = builder.bind(("available", available));
        }
        if let Some(sort_order) = input.sort_order {
            builder = builder.bind(("sort_order", sort_order));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<MenuItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "menu_item",
            id: id_str,
        })?;

        Ok(row.into_menu_item(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        self.db
            .query(
                "DELETE type::record('menu_item', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        include_unavailable: bool,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<MenuItem>> {
        let tenant_id_str = tenant_id.to_string();

        // The availability filter applies to the count and the page alike.
        let availability = if include_unavailable {
            ""
        } else {
            " AND available = true"
        };

        let count_query = format!(
            "SELECT count() AS total FROM menu_item \
             WHERE tenant_id = $tenant_id{availability} GROUP ALL"
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
            "SELECT meta::id(id) AS record_id, * FROM menu_item \
             WHERE tenant_id = $tenant_id{availability} \
             ORDER BY category ASC, sort_order ASC, name ASC \
             LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&page_query)
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MenuItemRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_menu_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self, tenant_id: Uuid) -> PosResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM menu_item \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
