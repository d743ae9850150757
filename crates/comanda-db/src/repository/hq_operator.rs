//! SurrealDB implementation of [`HqOperatorRepository`].
//!
//! Operators are global scope. Their passwords are hashed with Argon2id at
//! creation time, same as staff accounts.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::hq::{CreateHqOperator, HqOperator, OperatorStatus};
use comanda_core::repository::HqOperatorRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OperatorRow {
    username: String,
    display_name: String,
    password_hash: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OperatorRowWithId {
    record_id: String,
    username: String,
    display_name: String,
    password_hash: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<OperatorStatus, DbError> {
    match s {
        "Active" => Ok(OperatorStatus::Active),
        "Suspended" => Ok(OperatorStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown operator status: {other}"))),
    }
}

impl OperatorRow {
    fn into_operator(self, id: Uuid) -> Result<HqOperator, DbError> {
        Ok(HqOperator {
            id,
            username: self.username,
            display_name: self.display_name,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OperatorRowWithId {
    fn try_into_operator(self) -> Result<HqOperator, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(HqOperator {
            id,
            username: self.username,
            display_name: self.display_name,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the HQ operator repository.
#[derive(Clone)]
pub struct SurrealHqOperatorRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealHqOperatorRepository<C> {
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

impl<C: Connection> HqOperatorRepository for SurrealHqOperatorRepository<C> {
    async fn create(&self, input: CreateHqOperator) -> PosResult<HqOperator> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = super::hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('hq_operator', $id) SET \
                 username = $username, \
                 display_name = $display_name, \
                 password_hash = $password_hash, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("display_name", input.display_name))
            .bind(("password_hash", password_hash))
            .bind(("status", "Active".to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<OperatorRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "hq_operator",
            id: id_str,
        })?;

        Ok(row.into_operator(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PosResult<HqOperator> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('hq_operator', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OperatorRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "hq_operator",
            id: id_str,
        })?;

        Ok(row.into_operator(id)?)
    }

    async fn get_by_username(&self, username: &str) -> PosResult<HqOperator> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM hq_operator \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OperatorRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hq_operator",
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_operator()?)
    }
}
