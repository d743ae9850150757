//! Entitlement resolution and gating.
//!
//! The HQ client record is the authority for a tenant's plan and
//! subscription status. Every successful resolution writes through to
//! the per-tenant snapshot, which keeps the restaurant serving when the
//! authority is unreachable: operational actions run off a snapshot of
//! any age, administrative ones refuse once it is older than
//! [`SNAPSHOT_MAX_AGE_HOURS`].

use std::future::Future;

use chrono::Utc;
use comanda_core::error::{Error, PosResult};
use comanda_core::models::entitlement::{
    ActionClass, EntitlementSnapshot, Entitlements, Feature, LimitKind, SNAPSHOT_MAX_AGE_HOURS,
};
use comanda_core::repository::{ClientRepository, SnapshotRepository};
use uuid::Uuid;

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementSource {
    /// Live answer from the HQ client record.
    Authority,
    /// Last persisted snapshot, used while the authority is down.
    Snapshot { age_hours: i64 },
}

/// A tenant's entitlements together with how they were obtained.
#[derive(Debug, Clone)]
pub struct ResolvedEntitlements {
    pub entitlements: Entitlements,
    pub source: EntitlementSource,
}

/// Gate checks the order/menu/staff services call before acting.
///
/// Generic seam so the services can be tested with canned answers.
pub trait EntitlementCheck: Send + Sync {
    /// Refuse when the subscription blocks gated actions or when a
    /// stale snapshot forbids the action class.
    fn require_active(
        &self,
        tenant_id: Uuid,
        class: ActionClass,
    ) -> impl Future<Output = PosResult<()>> + Send;

    /// `require_active` plus a plan feature requirement.
    fn check_feature(
        &self,
        tenant_id: Uuid,
        feature: Feature,
        class: ActionClass,
    ) -> impl Future<Output = PosResult<()>> + Send;

    /// `require_active` plus a headroom requirement: fails once
    /// `current` has reached the plan limit.
    fn check_limit(
        &self,
        tenant_id: Uuid,
        kind: LimitKind,
        current: u64,
    ) -> impl Future<Output = PosResult<()>> + Send;
}

/// Entitlement service backed by the client store with snapshot
/// fallback.
pub struct EntitlementService<D: ClientRepository, S: SnapshotRepository> {
    clients: D,
    snapshots: S,
}

impl<D: ClientRepository, S: SnapshotRepository> EntitlementService<D, S> {
    pub fn new(clients: D, snapshots: S) -> Self {
        Self { clients, snapshots }
    }

    /// Resolve a tenant's entitlements, preferring the authority.
    ///
    /// A live answer refreshes the snapshot. When the authority errors,
    /// the last snapshot is served instead; a missing snapshot on top of
    /// a down authority is `EntitlementsUnavailable`. An unknown tenant
    /// is `NotFound` regardless of snapshots.
    pub async fn resolve(&self, tenant_id: Uuid) -> PosResult<ResolvedEntitlements> {
        let authority_err = match self.clients.get_by_id(tenant_id).await {
            Ok(client) => {
                let snapshot = EntitlementSnapshot {
                    tenant_id,
                    plan: client.plan.clone(),
                    status: client.status.clone(),
                    refreshed_at: Utc::now(),
                };
                // Snapshot refresh is best effort; a write failure must
                // not take down a request the authority already answered.
                if let Err(e) = self.snapshots.upsert(snapshot).await {
                    tracing::warn!(%tenant_id, error = %e, "entitlement snapshot refresh failed");
                }
                return Ok(ResolvedEntitlements {
                    entitlements: Entitlements::for_plan(client.plan, client.status),
                    source: EntitlementSource::Authority,
                });
            }
            Err(e @ Error::NotFound { .. }) => return Err(e),
            Err(e) => e,
        };

        tracing::warn!(%tenant_id, error = %authority_err, "entitlement authority unreachable, trying snapshot");

        match self.snapshots.get(tenant_id).await {
            Ok(snapshot) => {
                let age_hours = snapshot.age_hours(Utc::now());
                Ok(ResolvedEntitlements {
                    entitlements: Entitlements::for_plan(snapshot.plan, snapshot.status),
                    source: EntitlementSource::Snapshot { age_hours },
                })
            }
            Err(_) => Err(Error::EntitlementsUnavailable),
        }
    }

    fn enforce(resolved: &ResolvedEntitlements, class: ActionClass) -> PosResult<()> {
        if resolved.entitlements.status.blocks_gated_actions() {
            return Err(Error::SubscriptionInactive {
                status: format!("{:?}", resolved.entitlements.status),
            });
        }
        // A stale snapshot keeps service running but blocks
        // configuration until the authority answers again.
        if let EntitlementSource::Snapshot { age_hours } = resolved.source {
            if age_hours > SNAPSHOT_MAX_AGE_HOURS && class == ActionClass::Administrative {
                return Err(Error::EntitlementsStale { age_hours });
            }
        }
        Ok(())
    }
}

impl<D: ClientRepository, S: SnapshotRepository> EntitlementCheck for EntitlementService<D, S> {
    async fn require_active(&self, tenant_id: Uuid, class: ActionClass) -> PosResult<()> {
        let resolved = self.resolve(tenant_id).await?;
        Self::enforce(&resolved, class)
    }

    async fn check_feature(
        &self,
        tenant_id: Uuid,
        feature: Feature,
        class: ActionClass,
    ) -> PosResult<()> {
        let resolved = self.resolve(tenant_id).await?;
        Self::enforce(&resolved, class)?;
        if !resolved.entitlements.has_feature(&feature) {
            return Err(Error::FeatureNotAvailable {
                feature: format!("{feature:?}"),
            });
        }
        Ok(())
    }

    async fn check_limit(&self, tenant_id: Uuid, kind: LimitKind, current: u64) -> PosResult<()> {
        let resolved = self.resolve(tenant_id).await?;
        Self::enforce(&resolved, kind.action_class())?;
        let max = resolved.entitlements.limits.get(&kind);
        if current >= max {
            return Err(Error::LimitExceeded {
                limit: format!("{kind:?}"),
                max,
            });
        }
        Ok(())
    }
}
