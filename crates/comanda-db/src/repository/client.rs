//! SurrealDB implementation of [`ClientRepository`].
//!
//! Clients are global-scope records (no tenant_id field — the record id
//! IS the tenant id every other table references). New clients start in
//! `Trial` status; plan, status and billing-period changes go through
//! the dedicated setters so the HQ service can append subscription
//! events around them.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::client::{Client, ClientStatus, CreateClient, Plan, UpdateClient};
use comanda_core::repository::{ClientRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ClientRow {
    name: String,
    slug: String,
    plan: String,
    status: String,
    contact_email: String,
    currency: String,
    trial_ends_at: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ClientRowWithId {
    record_id: String,
    name: String,
    slug: String,
    plan: String,
    status: String,
    contact_email: String,
    currency: String,
    trial_ends_at: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_plan(s: &str) -> Result<Plan, DbError> {
    match s {
        "Starter" => Ok(Plan::Starter),
        "Standard" => Ok(Plan::Standard),
        "Premium" => Ok(Plan::Premium),
        other => Err(DbError::Decode(format!("unknown plan: {other}"))),
    }
}

pub(crate) fn plan_to_str(plan: &Plan) -> &'static str {
    match plan {
        Plan::Starter => "Starter",
        Plan::Standard => "Standard",
        Plan::Premium => "Premium",
    }
}

pub(crate) fn parse_status(s: &str) -> Result<ClientStatus, DbError> {
    match s {
        "Trial" => Ok(ClientStatus::Trial),
        "Active" => Ok(ClientStatus::Active),
        "PastDue" => Ok(ClientStatus::PastDue),
        "Suspended" => Ok(ClientStatus::Suspended),
        "Cancelled" => Ok(ClientStatus::Cancelled),
        other => Err(DbError::Decode(format!("unknown client status: {other}"))),
    }
}

pub(crate) fn status_to_str(status: &ClientStatus) -> &'static str {
    match status {
        ClientStatus::Trial => "Trial",
        ClientStatus::Active => "Active",
        ClientStatus::PastDue => "PastDue",
        ClientStatus::Suspended => "Suspended",
        ClientStatus::Cancelled => "Cancelled",
    }
}

impl ClientRow {
    fn into_client(self, id: Uuid) -> Result<Client, DbError> {
        Ok(Client {
            id,
            name: self.name,
            slug: self.slug,
            plan: parse_plan(&self.plan)?,
            status: parse_status(&self.status)?,
            contact_email: self.contact_email,
            currency: self.currency,
            trial_ends_at: self.trial_ends_at,
            current_period_end: self.current_period_end,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ClientRowWithId {
    fn try_into_client(self) -> Result<Client, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Client {
            id,
            name: self.name,
            slug: self.slug,
            plan: parse_plan(&self.plan)?,
            status: parse_status(&self.status)?,
            contact_email: self.contact_email,
            currency: self.currency,
            trial_ends_at: self.trial_ends_at,
            current_period_end: self.current_period_end,
            metadata: self.metadata,
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

/// SurrealDB implementation of the Client repository.
#[derive(Clone)]
pub struct SurrealClientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClientRepository for SurrealClientRepository<C> {
    async fn create(&self, input: CreateClient) -> PosResult<Client> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let currency = input.currency.unwrap_or_else(|| "EUR".to_string());
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('client', $id) SET \
                 name = $name, slug = $slug, \
                 plan = $plan, status = $status, \
                 contact_email = $contact_email, \
                 currency = $currency, \
                 trial_ends_at = $trial_ends_at, \
                 current_period_end = NONE, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("plan", plan_to_str(&input.plan).to_string()))
            .bind(("status", "Trial".to_string()))
            .bind(("contact_email", input.contact_email))
            .bind(("currency", currency))
            .bind(("trial_ends_at", input.trial_ends_at))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PosResult<Client> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('client', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> PosResult<Client> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 WHERE slug = $slug",
            )
            .bind(("slug", slug_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client",
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_client()?)
    }

    async fn update(&self, id: Uuid, input: UpdateClient) -> PosResult<Client> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.contact_email.is_some() {
            sets.push("contact_email = $contact_email");
        }
        if input.currency.is_some() {
            sets.push("currency = $currency");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('client', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(contact_email) = input.contact_email {
            builder = builder.bind(("contact_email", contact_email));
        }
        if let Some(currency) = input.currency {
            builder = builder.bind(("currency", currency));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn set_plan(&self, id: Uuid, plan: Plan) -> PosResult<Client> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('client', $id) SET \
                 plan = $plan, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("plan", plan_to_str(&plan).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn set_status(&self, id: Uuid, status: ClientStatus) -> PosResult<Client> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('client', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(&status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn renew(&self, id: Uuid, period_end: DateTime<Utc>) -> PosResult<Client> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('client', $id) SET \
                 current_period_end = $period_end, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("period_end", period_end))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client",
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn list(&self, pagination: Pagination) -> PosResult<PaginatedResult<Client>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM client GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_client())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
