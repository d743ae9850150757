//! SurrealDB implementation of [`AccessCodeRepository`].

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::access_code::{AccessCode, CreateAccessCode};
use comanda_core::repository::{AccessCodeRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AccessCodeRow {
    tenant_id: String,
    code: String,
    label: Option<String>,
    max_uses: u32,
    use_count: u32,
    revoked: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AccessCodeRowWithId {
    record_id: String,
    tenant_id: String,
    code: String,
    label: Option<String>,
    max_uses: u32,
    use_count: u32,
    revoked: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccessCodeRow {
    fn into_access_code(self, id: Uuid) -> Result<AccessCode, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(AccessCode {
            id,
            tenant_id,
            code: self.code,
            label: self.label,
            max_uses: self.max_uses,
            use_count: self.use_count,
            revoked: self.revoked,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccessCodeRowWithId {
    fn try_into_access_code(self) -> Result<AccessCode, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(AccessCode {
            id,
            tenant_id,
            code: self.code,
            label: self.label,
            max_uses: self.max_uses,
            use_count: self.use_count,
            revoked: self.revoked,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the access code repository.
#[derive(Clone)]
pub struct SurrealAccessCodeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccessCodeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AccessCodeRepository for SurrealAccessCodeRepository<C> {
    async fn create(&self, input: CreateAccessCode) -> PosResult<AccessCode> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('access_code', $id) SET \
                 tenant_id = $tenant_id, \
                 code = $code, \
                 label = $label, \
                 max_uses = $max_uses, \
                 use_count = 0, \
                 revoked = false, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("code", input.code))
            .bind(("label", input.label))
            .bind(("max_uses", input.max_uses))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AccessCodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "access_code",
            id: id_str,
        })?;

        Ok(row.into_access_code(id)?)
    }

    async fn get_by_code(&self, tenant_id: Uuid, code: &str) -> PosResult<AccessCode> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_code \
                 WHERE tenant_id = $tenant_id AND code = $code",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessCodeRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "access_code",
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_access_code()?)
    }

    async fn redeem(&self, tenant_id: Uuid, code: &str) -> PosResult<AccessCode> {
        let existing = self.get_by_code(tenant_id, code).await?;
        let id_str = existing.id.to_string();

        // The redeemability conditions live inside the UPDATE, so two
        // concurrent redemptions cannot both take the last use.
        let result = self
            .db
            .query(
                "UPDATE type::record('access_code', $id) SET \
                 use_count += 1, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id \
                 AND revoked = false \
                 AND use_count < max_uses \
                 AND (expires_at IS NONE OR expires_at > time::now())",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AccessCodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "access_code",
            id: id_str,
        })?;

        Ok(row.into_access_code(existing.id)?)
    }

    async fn revoke(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('access_code', $id) SET \
                 revoked = true, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AccessCodeRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "access_code",
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<AccessCode>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM access_code \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_code \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessCodeRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_access_code())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
