//! Menu management and the customer-facing menu listing.

use comanda_core::error::{Error, PosResult};
use comanda_core::models::entitlement::{ActionClass, LimitKind};
use comanda_core::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use comanda_core::repository::{MenuItemRepository, PaginatedResult, Pagination};
use comanda_entitle::EntitlementCheck;
use uuid::Uuid;

pub struct MenuService<M: MenuItemRepository, E: EntitlementCheck> {
    menu: M,
    entitlements: E,
}

impl<M: MenuItemRepository, E: EntitlementCheck> MenuService<M, E> {
    pub fn new(menu: M, entitlements: E) -> Self {
        Self { menu, entitlements }
    }

    /// Create a menu item. Administrative; counts against
    /// `max_menu_items`.
    pub async fn create(&self, input: CreateMenuItem) -> PosResult<MenuItem> {
        validate_name(&input.name)?;
        validate_price(input.price_cents)?;

        let current = self.menu.count(input.tenant_id).await?;
        self.entitlements
            .check_limit(input.tenant_id, LimitKind::MaxMenuItems, current)
            .await?;

        self.menu.create(input).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> PosResult<MenuItem> {
        self.menu.get_by_id(tenant_id, id).await
    }

    /// Update a menu item. Administrative. Open orders keep the name
    /// and price they captured at placement.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateMenuItem,
    ) -> PosResult<MenuItem> {
        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(price_cents) = input.price_cents {
            validate_price(price_cents)?;
        }
        self.entitlements
            .require_active(tenant_id, ActionClass::Administrative)
            .await?;
        self.menu.update(tenant_id, id, input).await
    }

    /// Remove a menu item. Administrative.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        self.entitlements
            .require_active(tenant_id, ActionClass::Administrative)
            .await?;
        self.menu.delete(tenant_id, id).await
    }

    /// Staff listing: includes unavailable items.
    pub async fn staff_list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<MenuItem>> {
        self.menu.list(tenant_id, true, pagination).await
    }

    /// Customer-facing menu: available items only. A suspended or
    /// cancelled tenant's public menu goes dark with the rest of its
    /// surface.
    pub async fn customer_menu(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<MenuItem>> {
        self.entitlements
            .require_active(tenant_id, ActionClass::Operational)
            .await?;
        self.menu.list(tenant_id, false, pagination).await
    }
}

fn validate_name(name: &str) -> PosResult<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "menu item name must not be empty".into(),
        });
    }
    Ok(())
}

fn validate_price(price_cents: i64) -> PosResult<()> {
    if price_cents < 0 {
        return Err(Error::Validation {
            message: "price must not be negative".into(),
        });
    }
    Ok(())
}
