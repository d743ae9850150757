//! Authentication services for staff and HQ operator logins.

use chrono::{Duration, Utc};
use comanda_core::error::{Error, PosResult};
use comanda_core::models::hq::OperatorStatus;
use comanda_core::models::session::CreateSession;
use comanda_core::models::staff::StaffStatus;
use comanda_core::repository::{HqOperatorRepository, SessionRepository, StaffRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, TokenScope};

/// Input for the staff login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub tenant_id: Uuid,
    pub username: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (return to client, not stored).
    pub refresh_token: String,
    /// Session ID (can be used for logout).
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub tenant_id: Uuid,
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful refresh result (new token pair).
#[derive(Debug)]
pub struct RefreshOutput {
    /// New signed JWT access token.
    pub access_token: String,
    /// New opaque refresh token (replaces the consumed one).
    pub refresh_token: String,
    /// New session ID.
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Staff authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<R: StaffRepository, S: SessionRepository> {
    staff_repo: R,
    session_repo: S,
    config: AuthConfig,
}

impl<R: StaffRepository, S: SessionRepository> AuthService<R, S> {
    pub fn new(staff_repo: R, session_repo: S, config: AuthConfig) -> Self {
        Self {
            staff_repo,
            session_repo,
            config,
        }
    }

    /// Authenticate a staff member with username + password and issue
    /// tokens.
    pub async fn login(&self, input: LoginInput) -> PosResult<LoginOutput> {
        // 1. Look up the staff user within the tenant.
        let staff = match self
            .staff_repo
            .get_by_username(input.tenant_id, &input.username)
            .await
        {
            Ok(u) => u,
            Err(Error::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &staff.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check account status.
        match staff.status {
            StaffStatus::Active => {}
            StaffStatus::Suspended => return Err(AuthError::AccountSuspended.into()),
        }

        // 4. Generate refresh token and create session.
        let raw_refresh = token::generate_refresh_token();
        let refresh_token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                tenant_id: input.tenant_id,
                user_id: staff.id,
                refresh_token_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 5. Issue JWT access token.
        let access_token = token::issue_access_token(
            staff.id,
            input.tenant_id,
            Some(staff.role),
            TokenScope::Staff,
            &self.config,
        )?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Rotate a refresh token: consume the old one, verify the staff
    /// member is still active, and issue a new token pair.
    ///
    /// Each refresh token is single-use. The old session is
    /// invalidated before the new one is created.
    pub async fn refresh(&self, input: RefreshInput) -> PosResult<RefreshOutput> {
        // 1. Look up session by token hash.
        let refresh_token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(input.tenant_id, &refresh_token_hash)
            .await
            .map_err(|e| match e {
                Error::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        // 2. Check session expiry.
        if session.expires_at <= Utc::now() {
            // Invalidate the expired session and reject.
            let _ = self
                .session_repo
                .invalidate(input.tenant_id, session.id)
                .await;
            return Err(AuthError::TokenExpired.into());
        }

        // 3. Invalidate old session (single-use guarantee).
        self.session_repo
            .invalidate(input.tenant_id, session.id)
            .await?;

        // 4. Verify the staff member is still active.
        let staff = self
            .staff_repo
            .get_by_id(input.tenant_id, session.user_id)
            .await?;
        match staff.status {
            StaffStatus::Active => {}
            StaffStatus::Suspended => return Err(AuthError::AccountSuspended.into()),
        }

        // 5. Create new session with rotated refresh token.
        let raw_refresh = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let new_session = self
            .session_repo
            .create(CreateSession {
                tenant_id: input.tenant_id,
                user_id: staff.id,
                refresh_token_hash: new_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue new access token.
        let access_token = token::issue_access_token(
            staff.id,
            input.tenant_id,
            Some(staff.role),
            TokenScope::Staff,
            &self.config,
        )?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: new_session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, tenant_id: Uuid, session_id: Uuid) -> PosResult<()> {
        self.session_repo.invalidate(tenant_id, session_id).await
    }

    /// Revoke all sessions for a staff member (e.g. on suspension or
    /// password change).
    pub async fn revoke_all_sessions(&self, tenant_id: Uuid, user_id: Uuid) -> PosResult<()> {
        self.session_repo
            .invalidate_user_sessions(tenant_id, user_id)
            .await
    }
}

/// Input for the HQ operator login flow.
#[derive(Debug)]
pub struct HqLoginInput {
    pub username: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for the HQ refresh token rotation flow.
#[derive(Debug)]
pub struct HqRefreshInput {
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// HQ operator authentication service.
///
/// Operators are global, so their sessions are stored under the nil
/// tenant UUID and their tokens carry the `hq` scope.
pub struct HqAuthService<H: HqOperatorRepository, S: SessionRepository> {
    operator_repo: H,
    session_repo: S,
    config: AuthConfig,
}

impl<H: HqOperatorRepository, S: SessionRepository> HqAuthService<H, S> {
    pub fn new(operator_repo: H, session_repo: S, config: AuthConfig) -> Self {
        Self {
            operator_repo,
            session_repo,
            config,
        }
    }

    /// Authenticate an HQ operator with username + password and issue
    /// tokens.
    pub async fn login(&self, input: HqLoginInput) -> PosResult<LoginOutput> {
        // 1. Look up the operator.
        let operator = match self.operator_repo.get_by_username(&input.username).await {
            Ok(o) => o,
            Err(Error::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &operator.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check account status.
        match operator.status {
            OperatorStatus::Active => {}
            OperatorStatus::Suspended => return Err(AuthError::AccountSuspended.into()),
        }

        // 4. Generate refresh token and create session under the nil
        //    tenant.
        let raw_refresh = token::generate_refresh_token();
        let refresh_token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                tenant_id: Uuid::nil(),
                user_id: operator.id,
                refresh_token_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 5. Issue JWT access token with the HQ scope.
        let access_token =
            token::issue_access_token(operator.id, Uuid::nil(), None, TokenScope::Hq, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Rotate an HQ refresh token. Single-use, same as the staff flow.
    pub async fn refresh(&self, input: HqRefreshInput) -> PosResult<RefreshOutput> {
        let refresh_token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(Uuid::nil(), &refresh_token_hash)
            .await
            .map_err(|e| match e {
                Error::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        if session.expires_at <= Utc::now() {
            let _ = self.session_repo.invalidate(Uuid::nil(), session.id).await;
            return Err(AuthError::TokenExpired.into());
        }

        self.session_repo
            .invalidate(Uuid::nil(), session.id)
            .await?;

        let operator = self.operator_repo.get_by_id(session.user_id).await?;
        match operator.status {
            OperatorStatus::Active => {}
            OperatorStatus::Suspended => return Err(AuthError::AccountSuspended.into()),
        }

        let raw_refresh = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let new_session = self
            .session_repo
            .create(CreateSession {
                tenant_id: Uuid::nil(),
                user_id: operator.id,
                refresh_token_hash: new_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        let access_token =
            token::issue_access_token(operator.id, Uuid::nil(), None, TokenScope::Hq, &self.config)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: new_session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Invalidate a single HQ session (logout).
    pub async fn logout(&self, session_id: Uuid) -> PosResult<()> {
        self.session_repo.invalidate(Uuid::nil(), session_id).await
    }
}
