//! Staff account management for owners.
//!
//! Passwords are hashed inside the staff repository; this service
//! enforces the password policy, the plan's staff limit, and session
//! revocation when an account is suspended or reset.

use comanda_core::error::{Error, PosResult};
use comanda_core::models::entitlement::{ActionClass, LimitKind};
use comanda_core::models::staff::{
    CreateStaffUser, MIN_PASSWORD_CHARS, StaffStatus, StaffUser, UpdateStaffUser,
};
use comanda_core::repository::{PaginatedResult, Pagination, SessionRepository, StaffRepository};
use comanda_entitle::EntitlementCheck;
use uuid::Uuid;

pub struct StaffService<R: StaffRepository, S: SessionRepository, E: EntitlementCheck> {
    staff: R,
    sessions: S,
    entitlements: E,
}

impl<R: StaffRepository, S: SessionRepository, E: EntitlementCheck> StaffService<R, S, E> {
    pub fn new(staff: R, sessions: S, entitlements: E) -> Self {
        Self {
            staff,
            sessions,
            entitlements,
        }
    }

    /// Create a staff account. Administrative; counts against
    /// `max_staff`.
    pub async fn create(&self, input: CreateStaffUser) -> PosResult<StaffUser> {
        if input.username.trim().is_empty() {
            return Err(Error::Validation {
                message: "username must not be empty".into(),
            });
        }
        if input.display_name.trim().is_empty() {
            return Err(Error::Validation {
                message: "display name must not be empty".into(),
            });
        }
        validate_password(&input.password)?;

        let current = self.staff.count_active(input.tenant_id).await?;
        self.entitlements
            .check_limit(input.tenant_id, LimitKind::MaxStaff, current)
            .await?;

        self.staff.create(input).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> PosResult<StaffUser> {
        self.staff.get_by_id(tenant_id, id).await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<StaffUser>> {
        self.staff.list(tenant_id, pagination).await
    }

    /// Update display name, role or status. Suspending revokes every
    /// session of the account.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateStaffUser,
    ) -> PosResult<StaffUser> {
        if let Some(display_name) = &input.display_name {
            if display_name.trim().is_empty() {
                return Err(Error::Validation {
                    message: "display name must not be empty".into(),
                });
            }
        }
        self.entitlements
            .require_active(tenant_id, ActionClass::Administrative)
            .await?;

        let suspending = matches!(input.status, Some(StaffStatus::Suspended));
        let updated = self.staff.update(tenant_id, id, input).await?;
        if suspending {
            self.sessions.invalidate_user_sessions(tenant_id, id).await?;
        }
        Ok(updated)
    }

    /// Owner-driven password reset. Revokes every session of the
    /// account.
    pub async fn set_password(&self, tenant_id: Uuid, id: Uuid, password: &str) -> PosResult<()> {
        validate_password(password)?;
        self.entitlements
            .require_active(tenant_id, ActionClass::Administrative)
            .await?;
        self.staff.set_password(tenant_id, id, password).await?;
        self.sessions.invalidate_user_sessions(tenant_id, id).await
    }

    /// Soft-delete: suspends the account and revokes its sessions.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        self.entitlements
            .require_active(tenant_id, ActionClass::Administrative)
            .await?;
        self.staff.delete(tenant_id, id).await?;
        self.sessions.invalidate_user_sessions(tenant_id, id).await
    }
}

fn validate_password(password: &str) -> PosResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::Validation {
            message: format!("password must be at least {MIN_PASSWORD_CHARS} characters"),
        });
    }
    Ok(())
}
