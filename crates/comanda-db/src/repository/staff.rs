//! SurrealDB implementation of [`StaffRepository`].
//!
//! Passwords are hashed with Argon2id at creation time (see
//! [`hash_password`](super::hash_password)); an optional pepper can be
//! provided at construction.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::staff::{
    CreateStaffUser, StaffRole, StaffStatus, StaffUser, UpdateStaffUser,
};
use comanda_core::repository::{PaginatedResult, Pagination, StaffRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct StaffRow {
    tenant_id: String,
    username: String,
    display_name: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct StaffRowWithId {
    record_id: String,
    tenant_id: String,
    username: String,
    display_name: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<StaffRole, DbError> {
    match s {
        "Owner" => Ok(StaffRole::Owner),
        "Manager" => Ok(StaffRole::Manager),
        "Cashier" => Ok(StaffRole::Cashier),
        "Kitchen" => Ok(StaffRole::Kitchen),
        "Waiter" => Ok(StaffRole::Waiter),
        other => Err(DbError::Decode(format!("unknown staff role: {other}"))),
    }
}

fn role_to_str(role: &StaffRole) -> &'static str {
    match role {
        StaffRole::Owner => "Owner",
        StaffRole::Manager => "Manager",
        StaffRole::Cashier => "Cashier",
        StaffRole::Kitchen => "Kitchen",
        StaffRole::Waiter => "Waiter",
    }
}

fn parse_status(s: &str) -> Result<StaffStatus, DbError> {
    match s {
        "Active" => Ok(StaffStatus::Active),
        "Suspended" => Ok(StaffStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown staff status: {other}"))),
    }
}

fn status_to_str(status: &StaffStatus) -> &'static str {
    match status {
        StaffStatus::Active => "Active",
        StaffStatus::Suspended => "Suspended",
    }
}

impl StaffRow {
    fn into_staff(self, id: Uuid) -> Result<StaffUser, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(StaffUser {
            id,
            tenant_id,
            username: self.username,
            display_name: self.display_name,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StaffRowWithId {
    fn try_into_staff(self) -> Result<StaffUser, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        Ok(StaffUser {
            id,
            tenant_id,
            username: self.username,
            display_name: self.display_name,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Staff repository.
#[derive(Clone)]
pub struct SurrealStaffRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealStaffRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> StaffRepository for SurrealStaffRepository<C> {
    async fn create(&self, input: CreateStaffUser) -> PosResult<StaffUser> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = super::hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('staff_user', $id) SET \
                 tenant_id = $tenant_id, \
                 username = $username, \
                 display_name = $display_name, \
                 password_hash = $password_hash, \
                 role = $role, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("username", input.username))
            .bind(("display_name", input.display_name))
            .bind(("password_hash", password_hash))
            .bind(("role", role_to_str(&input.role).to_string()))
            .bind(("status", "Active".to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "staff_user",
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> PosResult<StaffUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('staff_user', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "staff_user",
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn get_by_username(&self, tenant_id: Uuid, username: &str) -> PosResult<StaffUser> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff_user \
                 WHERE tenant_id = $tenant_id AND username = $username",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff_user",
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_staff()?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateStaffUser,
    ) -> PosResult<StaffUser> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('staff_user', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(ref role) = input.role {
            builder = builder.bind(("role", role_to_str(role).to_string()));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status_to_str(status).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "staff_user",
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn set_password(&self, tenant_id: Uuid, id: Uuid, password: &str) -> PosResult<()> {
        let id_str = id.to_string();
        let password_hash = super::hash_password(password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "UPDATE type::record('staff_user', $id) SET \
                 password_hash = $password_hash, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "staff_user",
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        // Soft-delete: set status to Suspended.
        self.db
            .query(
                "UPDATE type::record('staff_user', $id) SET \
                 status = 'Suspended', updated_at = time::now() \
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
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<StaffUser>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM staff_user \
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
                "SELECT meta::id(id) AS record_id, * FROM staff_user \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_staff())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_active(&self, tenant_id: Uuid) -> PosResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM staff_user \
                 WHERE tenant_id = $tenant_id AND status = 'Active' \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

/// Verify a password against an Argon2id hash.
///
/// Public for use by the auth layer.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::{Argon2, PasswordVerifier};

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Hash(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
    }
}
