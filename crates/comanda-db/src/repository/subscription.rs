//! SurrealDB implementation of [`SubscriptionEventRepository`].
//!
//! Events are append-only. The event kind is stored as a tagged object in
//! a flexible field and decoded back through serde.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::subscription::{
    CreateSubscriptionEvent, SubscriptionEvent, SubscriptionEventKind,
};
use comanda_core::repository::{PaginatedResult, Pagination, SubscriptionEventRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EventRow {
    client_id: String,
    kind: serde_json::Value,
    actor: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct EventRowWithId {
    record_id: String,
    client_id: String,
    kind: serde_json::Value,
    actor: Option<String>,
    created_at: DateTime<Utc>,
}

fn decode_kind(value: serde_json::Value) -> Result<SubscriptionEventKind, DbError> {
    serde_json::from_value(value)
        .map_err(|e| DbError::Decode(format!("invalid subscription event kind: {e}")))
}

fn decode_actor(actor: Option<String>) -> Result<Option<Uuid>, DbError> {
    actor
        .map(|v| {
            Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid actor UUID: {e}")))
        })
        .transpose()
}

impl EventRow {
    fn into_event(self, id: Uuid) -> Result<SubscriptionEvent, DbError> {
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client UUID: {e}")))?;
        Ok(SubscriptionEvent {
            id,
            client_id,
            kind: decode_kind(self.kind)?,
            actor: decode_actor(self.actor)?,
            created_at: self.created_at,
        })
    }
}

impl EventRowWithId {
    fn try_into_event(self) -> Result<SubscriptionEvent, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client UUID: {e}")))?;
        Ok(SubscriptionEvent {
            id,
            client_id,
            kind: decode_kind(self.kind)?,
            actor: decode_actor(self.actor)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the subscription event repository.
#[derive(Clone)]
pub struct SurrealSubscriptionEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubscriptionEventRepository for SurrealSubscriptionEventRepository<C> {
    async fn append(&self, input: CreateSubscriptionEvent) -> PosResult<SubscriptionEvent> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let kind = serde_json::to_value(&input.kind)
            .map_err(|e| DbError::Decode(format!("unencodable event kind: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('subscription_event', $id) SET \
                 client_id = $client_id, \
                 kind = $kind, \
                 actor = $actor",
            )
            .bind(("id", id_str.clone()))
            .bind(("client_id", input.client_id.to_string()))
            .bind(("kind", kind))
            .bind(("actor", input.actor.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "subscription_event",
            id: id_str,
        })?;

        Ok(row.into_event(id)?)
    }

    async fn list_by_client(
        &self,
        client_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<SubscriptionEvent>> {
        let client_id_str = client_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM subscription_event \
                 WHERE client_id = $client_id GROUP ALL",
            )
            .bind(("client_id", client_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription_event \
                 WHERE client_id = $client_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("client_id", client_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
