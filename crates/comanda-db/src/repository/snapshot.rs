//! SurrealDB implementation of [`SnapshotRepository`].
//!
//! Each tenant has at most one snapshot row and the record ID is the
//! tenant ID itself, so refreshing is a plain UPSERT.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::entitlement::EntitlementSnapshot;
use comanda_core::repository::SnapshotRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::client::{parse_plan, parse_status, plan_to_str, status_to_str};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SnapshotRow {
    tenant_id: String,
    plan: String,
    status: String,
    refreshed_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn try_into_snapshot(self) -> Result<EntitlementSnapshot, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(EntitlementSnapshot {
            tenant_id,
            plan: parse_plan(&self.plan)?,
            status: parse_status(&self.status)?,
            refreshed_at: self.refreshed_at,
        })
    }
}

/// SurrealDB implementation of the entitlement snapshot repository.
#[derive(Clone)]
pub struct SurrealSnapshotRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSnapshotRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SnapshotRepository for SurrealSnapshotRepository<C> {
    async fn upsert(&self, snapshot: EntitlementSnapshot) -> PosResult<()> {
        self.db
            .query(
                "UPSERT type::record('entitlement_snapshot', $tenant_id) SET \
                 tenant_id = $tenant_id, \
                 plan = $plan, \
                 status = $status, \
                 refreshed_at = $refreshed_at",
            )
            .bind(("tenant_id", snapshot.tenant_id.to_string()))
            .bind(("plan", plan_to_str(&snapshot.plan).to_string()))
            .bind(("status", status_to_str(&snapshot.status).to_string()))
            .bind(("refreshed_at", snapshot.refreshed_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get(&self, tenant_id: Uuid) -> PosResult<EntitlementSnapshot> {
        let tenant_id_str = tenant_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('entitlement_snapshot', $tenant_id)")
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SnapshotRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "entitlement_snapshot",
            id: tenant_id_str,
        })?;

        Ok(row.try_into_snapshot()?)
    }
}
