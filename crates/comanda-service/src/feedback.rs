//! Customer feedback intake and the staff listing over it.

use comanda_core::error::{Error, PosResult};
use comanda_core::models::entitlement::{ActionClass, Feature};
use comanda_core::models::feedback::{
    CreateFeedback, Feedback, MAX_COMMENT_CHARS, MAX_RATING, MIN_RATING,
};
use comanda_core::repository::{FeedbackRepository, PaginatedResult, Pagination};
use comanda_entitle::EntitlementCheck;
use uuid::Uuid;

pub struct FeedbackService<F: FeedbackRepository, E: EntitlementCheck> {
    feedback: F,
    entitlements: E,
}

impl<F: FeedbackRepository, E: EntitlementCheck> FeedbackService<F, E> {
    pub fn new(feedback: F, entitlements: E) -> Self {
        Self {
            feedback,
            entitlements,
        }
    }

    /// Accept a feedback submission. Gated on the `Feedback` feature.
    pub async fn submit(&self, input: CreateFeedback) -> PosResult<Feedback> {
        self.entitlements
            .check_feature(input.tenant_id, Feature::Feedback, ActionClass::Operational)
            .await?;

        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(Error::Validation {
                message: format!("rating must be between {MIN_RATING} and {MAX_RATING} stars"),
            });
        }
        if let Some(comment) = &input.comment {
            if comment.chars().count() > MAX_COMMENT_CHARS {
                return Err(Error::Validation {
                    message: format!("comment exceeds {MAX_COMMENT_CHARS} characters"),
                });
            }
        }

        self.feedback.create(input).await
    }

    /// Staff listing, newest first. The whole surface is plan-gated.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<Feedback>> {
        self.entitlements
            .check_feature(tenant_id, Feature::Feedback, ActionClass::Operational)
            .await?;
        self.feedback.list(tenant_id, pagination).await
    }
}
