//! Maps the core error to HTTP responses in one place.
//!
//! Bodies are `{"error": {"code", "message"}}`. Server-side failures
//! are logged with their detail and reported as a generic message.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use comanda_core::error::Error;
use serde_json::json;
use tracing::error;

/// Response-side wrapper for [`Error`]. Handlers return
/// `Result<_, ApiError>` and bubble service errors up with `?`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::AlreadyExists { .. } | Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::Validation { .. } | Error::TenantContext => StatusCode::BAD_REQUEST,
        Error::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
        Error::AuthorizationDenied { .. }
        | Error::FeatureNotAvailable { .. }
        | Error::LimitExceeded { .. }
        | Error::SubscriptionInactive { .. }
        | Error::EntitlementsStale { .. } => StatusCode::FORBIDDEN,
        Error::EntitlementsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        Error::Database(_) | Error::Crypto(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn code_for(err: &Error) -> &'static str {
    match err {
        Error::NotFound { .. } => "not_found",
        Error::AlreadyExists { .. } => "already_exists",
        Error::AuthenticationFailed { .. } => "authentication_failed",
        Error::AuthorizationDenied { .. } => "authorization_denied",
        Error::Validation { .. } => "validation",
        Error::InvalidTransition { .. } => "invalid_transition",
        Error::FeatureNotAvailable { .. } => "feature_not_available",
        Error::LimitExceeded { .. } => "limit_exceeded",
        Error::SubscriptionInactive { .. } => "subscription_inactive",
        Error::EntitlementsStale { .. } => "entitlements_stale",
        Error::EntitlementsUnavailable => "entitlements_unavailable",
        Error::TenantContext => "tenant_context",
        Error::RateLimited => "rate_limited",
        Error::Database(_) | Error::Crypto(_) | Error::Internal(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        // Internal detail goes to the log, not the wire.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(json!({
            "error": { "code": code_for(&self.0), "message": message }
        }));

        let mut response = (status, body).into_response();
        if matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from_static("5"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_for(err: Error) -> Response {
        ApiError::from(err).into_response()
    }

    #[test]
    fn statuses_follow_the_error_contract() {
        let cases = [
            (
                Error::NotFound {
                    entity: "order",
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::AlreadyExists { entity: "client" },
                StatusCode::CONFLICT,
            ),
            (
                Error::InvalidTransition {
                    entity: "order",
                    from: "Served".into(),
                    to: "Pending".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::Validation {
                    message: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (Error::TenantContext, StatusCode::BAD_REQUEST),
            (
                Error::AuthenticationFailed {
                    reason: "nope".into(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                Error::FeatureNotAvailable {
                    feature: "Feedback".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::LimitExceeded {
                    limit: "max_staff".into(),
                    max: 3,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::SubscriptionInactive {
                    status: "Suspended".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (Error::EntitlementsStale { age_hours: 30 }, StatusCode::FORBIDDEN),
            (
                Error::EntitlementsUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (Error::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                Error::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(response_for(err).status(), expected);
        }
    }

    #[test]
    fn throttling_responses_carry_retry_after() {
        let response = response_for(Error::RateLimited);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("retry-after").unwrap(),
            &HeaderValue::from_static("5")
        );

        let response = response_for(Error::EntitlementsUnavailable);
        assert!(response.headers().contains_key("retry-after"));

        let response = response_for(Error::TenantContext);
        assert!(!response.headers().contains_key("retry-after"));
    }
}
