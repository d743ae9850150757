//! SurrealDB implementation of [`FeedbackRepository`].
//!
//! Feedback is append-only. There is deliberately no update or delete.

use chrono::{DateTime, Utc};
use comanda_core::error::PosResult;
use comanda_core::models::feedback::{CreateFeedback, Feedback};
use comanda_core::repository::{FeedbackRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct FeedbackRow {
    tenant_id: String,
    order_id: Option<String>,
    rating: u8,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct FeedbackRowWithId {
    record_id: String,
    tenant_id: String,
    order_id: Option<String>,
    rating: u8,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl FeedbackRow {
    fn into_feedback(self, id: Uuid) -> Result<Feedback, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let order_id = self
            .order_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Decode(format!("invalid order UUID: {e}")))
            })
            .transpose()?;
        Ok(Feedback {
            id,
            tenant_id,
            order_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

impl FeedbackRowWithId {
    fn try_into_feedback(self) -> Result<Feedback, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let order_id = self
            .order_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Decode(format!("invalid order UUID: {e}")))
            })
            .transpose()?;
        Ok(Feedback {
            id,
            tenant_id,
            order_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Feedback repository.
#[derive(Clone)]
pub struct SurrealFeedbackRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeedbackRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FeedbackRepository for SurrealFeedbackRepository<C> {
    async fn create(&self, input: CreateFeedback) -> PosResult<Feedback> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('feedback', $id) SET \
                 tenant_id = $tenant_id, \
                 order_id = $order_id, \
                 rating = $rating, \
                 comment = $comment",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("order_id", input.order_id.map(|u| u.to_string())))
            .bind(("rating", input.rating))
            .bind(("comment", input.comment))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<FeedbackRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "feedback",
            id: id_str,
        })?;

        Ok(row.into_feedback(id)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<Feedback>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM feedback \
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
                "SELECT meta::id(id) AS record_id, * FROM feedback \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_feedback())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
