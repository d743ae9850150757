//! HQ console operations: client lifecycle and the subscription event
//! log.
//!
//! HQ is the entitlement authority, so nothing here consults the
//! entitlement service. The plan and status written here are what
//! tenants resolve against.

use chrono::{DateTime, Utc};
use comanda_core::error::{Error, PosResult};
use comanda_core::models::client::{Client, ClientStatus, CreateClient, Plan, UpdateClient};
use comanda_core::models::entitlement::Entitlements;
use comanda_core::models::subscription::{
    CreateSubscriptionEvent, SubscriptionEvent, SubscriptionEventKind,
};
use comanda_core::repository::{
    ClientRepository, PaginatedResult, Pagination, SubscriptionEventRepository,
};
use uuid::Uuid;

pub struct HqService<C: ClientRepository, V: SubscriptionEventRepository> {
    clients: C,
    events: V,
}

impl<C: ClientRepository, V: SubscriptionEventRepository> HqService<C, V> {
    pub fn new(clients: C, events: V) -> Self {
        Self { clients, events }
    }

    /// Onboard a new client. Slugs are immutable and globally unique.
    pub async fn create_client(&self, input: CreateClient) -> PosResult<Client> {
        if input.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "client name must not be empty".into(),
            });
        }
        validate_slug(&input.slug)?;
        if !input.contact_email.contains('@') {
            return Err(Error::Validation {
                message: "contact email is not valid".into(),
            });
        }

        match self.clients.get_by_slug(&input.slug).await {
            Ok(_) => return Err(Error::AlreadyExists { entity: "client" }),
            Err(Error::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.clients.create(input).await
    }

    pub async fn get_client(&self, id: Uuid) -> PosResult<Client> {
        self.clients.get_by_id(id).await
    }

    pub async fn list_clients(&self, pagination: Pagination) -> PosResult<PaginatedResult<Client>> {
        self.clients.list(pagination).await
    }

    /// Update contact fields. Plan, status and renewal go through the
    /// dedicated operations below so every change leaves an event.
    pub async fn update_client(&self, id: Uuid, input: UpdateClient) -> PosResult<Client> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(Error::Validation {
                    message: "client name must not be empty".into(),
                });
            }
        }
        if let Some(email) = &input.contact_email {
            if !email.contains('@') {
                return Err(Error::Validation {
                    message: "contact email is not valid".into(),
                });
            }
        }
        self.clients.update(id, input).await
    }

    /// Move a client to a different plan, recording the change. Setting
    /// the current plan again is a no-op and leaves no event.
    pub async fn change_plan(&self, id: Uuid, plan: Plan, actor: Option<Uuid>) -> PosResult<Client> {
        let client = self.clients.get_by_id(id).await?;
        if client.plan == plan {
            return Ok(client);
        }

        let updated = self.clients.set_plan(id, plan.clone()).await?;
        self.events
            .append(CreateSubscriptionEvent {
                client_id: id,
                kind: SubscriptionEventKind::PlanChanged {
                    from: client.plan,
                    to: plan,
                },
                actor,
            })
            .await?;
        Ok(updated)
    }

    /// Change subscription status (suspend, reactivate, cancel),
    /// recording the change.
    pub async fn change_status(
        &self,
        id: Uuid,
        status: ClientStatus,
        actor: Option<Uuid>,
    ) -> PosResult<Client> {
        let client = self.clients.get_by_id(id).await?;
        if client.status == status {
            return Ok(client);
        }

        let updated = self.clients.set_status(id, status.clone()).await?;
        self.events
            .append(CreateSubscriptionEvent {
                client_id: id,
                kind: SubscriptionEventKind::StatusChanged {
                    from: client.status,
                    to: status,
                },
                actor,
            })
            .await?;
        Ok(updated)
    }

    /// Extend the billing period, recording the renewal. Status is not
    /// touched: reactivating a suspended client is an explicit status
    /// change.
    pub async fn renew(
        &self,
        id: Uuid,
        period_end: DateTime<Utc>,
        actor: Option<Uuid>,
    ) -> PosResult<Client> {
        if period_end <= Utc::now() {
            return Err(Error::Validation {
                message: "period end must be in the future".into(),
            });
        }

        let updated = self.clients.renew(id, period_end).await?;
        self.events
            .append(CreateSubscriptionEvent {
                client_id: id,
                kind: SubscriptionEventKind::Renewed { period_end },
                actor,
            })
            .await?;
        Ok(updated)
    }

    /// Subscription history, newest first.
    pub async fn subscription_events(
        &self,
        client_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<SubscriptionEvent>> {
        // Distinguish an unknown client from one with no history.
        self.clients.get_by_id(client_id).await?;
        self.events.list_by_client(client_id, pagination).await
    }

    /// Resolved entitlements of a client, straight from the authority.
    pub async fn entitlements(&self, client_id: Uuid) -> PosResult<Entitlements> {
        let client = self.clients.get_by_id(client_id).await?;
        Ok(Entitlements::for_plan(client.plan, client.status))
    }
}

/// Path segments under `/v1/` that can never be tenant slugs.
const RESERVED_SLUGS: &[&str] = &["staff", "hq", "healthz"];

/// Slugs become URL path segments and are printed into QR codes:
/// lowercase alphanumerics and hyphens, 2 to 64 chars, no leading or
/// trailing hyphen, not a reserved route name.
fn validate_slug(slug: &str) -> PosResult<()> {
    let ok = slug.len() >= 2
        && slug.len() <= 64
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !ok {
        return Err(Error::Validation {
            message: "slug must be 2-64 lowercase alphanumeric characters or hyphens".into(),
        });
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(Error::Validation {
            message: format!("slug '{slug}' is reserved"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation_accepts_url_safe_names() {
        assert!(validate_slug("trattoria-da-mario").is_ok());
        assert!(validate_slug("a1").is_ok());
        assert!(validate_slug("x").is_err());
        assert!(validate_slug("Has-Caps").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("spaced out").is_err());
    }

    #[test]
    fn reserved_route_names_are_not_slugs() {
        assert!(validate_slug("staff").is_err());
        assert!(validate_slug("hq").is_err());
        assert!(validate_slug("healthz").is_err());
        assert!(validate_slug("staffing").is_ok());
    }
}
