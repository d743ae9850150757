//! Bearer-token authentication middleware and the authenticated
//! request contexts handlers extract from it.
//!
//! The middleware validates the JWT (signature, expiry, issuer) and
//! checks the scope; a missing or bad token is `401`, a wrong scope is
//! `403`. Role checks stay in the handlers because they depend on the
//! operation, not the route group.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use comanda_auth::token::validate_access_token;
use comanda_auth::{TokenScope, ValidatedClaims};
use comanda_core::error::Error;
use comanda_core::models::staff::StaffRole;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::AuthenticationFailed {
            reason: "missing bearer token".into(),
        })
}

fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    scope: TokenScope,
) -> Result<ValidatedClaims, ApiError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, &state.auth).map_err(Error::from)?;
    if claims.0.scope != scope {
        return Err(Error::AuthorizationDenied {
            reason: "wrong token scope".into(),
        }
        .into());
    }
    Ok(claims)
}

pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), TokenScope::Staff) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

pub async fn require_hq(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), TokenScope::Hq) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Authenticated staff member, parsed out of the validated claims.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: StaffRole,
}

impl StaffContext {
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(Error::AuthorizationDenied {
                reason: "manager role required".into(),
            }
            .into())
        }
    }

    pub fn require_owner(&self) -> Result<(), ApiError> {
        if matches!(self.role, StaffRole::Owner) {
            Ok(())
        } else {
            Err(Error::AuthorizationDenied {
                reason: "owner role required".into(),
            }
            .into())
        }
    }

    pub fn require_order_entry(&self) -> Result<(), ApiError> {
        if self.role.may_place_orders() {
            Ok(())
        } else {
            Err(Error::AuthorizationDenied {
                reason: "role may not enter orders".into(),
            }
            .into())
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for StaffContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = validated_claims(parts)?;
        let tenant_id =
            Uuid::parse_str(&claims.0.tenant_id).map_err(|_| Error::TenantContext)?;
        let user_id =
            Uuid::parse_str(&claims.0.sub).map_err(|_| Error::AuthenticationFailed {
                reason: "malformed subject claim".into(),
            })?;
        let role = claims.0.role.ok_or_else(|| Error::AuthorizationDenied {
            reason: "token carries no staff role".into(),
        })?;
        Ok(Self {
            tenant_id,
            user_id,
            role,
        })
    }
}

/// Authenticated HQ operator.
#[derive(Debug, Clone, Copy)]
pub struct HqContext {
    pub operator_id: Uuid,
}

impl<S: Send + Sync> FromRequestParts<S> for HqContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = validated_claims(parts)?;
        let operator_id =
            Uuid::parse_str(&claims.0.sub).map_err(|_| Error::AuthenticationFailed {
                reason: "malformed subject claim".into(),
            })?;
        Ok(Self { operator_id })
    }
}

fn validated_claims(parts: &Parts) -> Result<ValidatedClaims, Error> {
    parts
        .extensions
        .get::<ValidatedClaims>()
        .cloned()
        .ok_or_else(|| Error::AuthenticationFailed {
            reason: "missing credentials".into(),
        })
}
