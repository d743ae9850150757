//! Integration tests for the HQ console service using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use comanda_core::error::Error;
use comanda_core::models::client::{ClientStatus, CreateClient, Plan, UpdateClient};
use comanda_core::models::entitlement::Feature;
use comanda_core::models::subscription::SubscriptionEventKind;
use comanda_core::repository::Pagination;
use comanda_db::repository::{SurrealClientRepository, SurrealSubscriptionEventRepository};
use comanda_service::HqService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = HqService<SurrealClientRepository<Db>, SurrealSubscriptionEventRepository<Db>>;

async fn setup() -> (Surreal<Db>, Service) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanda_db::run_migrations(&db).await.unwrap();

    let svc = HqService::new(
        SurrealClientRepository::new(db.clone()),
        SurrealSubscriptionEventRepository::new(db.clone()),
    );
    (db, svc)
}

fn new_client(name: &str, slug: &str, plan: Plan) -> CreateClient {
    CreateClient {
        name: name.into(),
        slug: slug.into(),
        plan,
        contact_email: "owner@example.com".into(),
        currency: None,
        trial_ends_at: None,
        metadata: None,
    }
}

#[tokio::test]
async fn new_clients_start_in_trial() {
    let (_db, svc) = setup().await;

    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Standard))
        .await
        .unwrap();

    assert_eq!(client.status, ClientStatus::Trial);
    assert_eq!(client.plan, Plan::Standard);
    assert_eq!(client.currency, "EUR");

    let fetched = svc.get_client(client.id).await.unwrap();
    assert_eq!(fetched.slug, "da-mario");
}

#[tokio::test]
async fn slugs_are_unique_and_validated() {
    let (_db, svc) = setup().await;

    svc.create_client(new_client("Da Mario", "da-mario", Plan::Starter))
        .await
        .unwrap();

    assert!(matches!(
        svc.create_client(new_client("Impostore", "da-mario", Plan::Starter))
            .await
            .unwrap_err(),
        Error::AlreadyExists { entity: "client" }
    ));

    for bad in ["x", "-leading", "trailing-", "Spaced Name", "café"] {
        assert!(matches!(
            svc.create_client(new_client("Bad Slug", bad, Plan::Starter))
                .await
                .unwrap_err(),
            Error::Validation { .. }
        ));
    }
}

#[tokio::test]
async fn update_touches_contact_fields_only() {
    let (_db, svc) = setup().await;
    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Starter))
        .await
        .unwrap();

    let updated = svc
        .update_client(
            client.id,
            UpdateClient {
                name: Some("Da Mario 2.0".into()),
                contact_email: Some("mario@example.com".into()),
                ..UpdateClient::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Da Mario 2.0");
    assert_eq!(updated.slug, "da-mario");
    assert_eq!(updated.plan, Plan::Starter);

    assert!(matches!(
        svc.update_client(
            client.id,
            UpdateClient {
                contact_email: Some("not-an-email".into()),
                ..UpdateClient::default()
            },
        )
        .await
        .unwrap_err(),
        Error::Validation { .. }
    ));
}

#[tokio::test]
async fn plan_changes_leave_an_event() {
    let (_db, svc) = setup().await;
    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Starter))
        .await
        .unwrap();
    let operator = Uuid::new_v4();

    let upgraded = svc
        .change_plan(client.id, Plan::Premium, Some(operator))
        .await
        .unwrap();
    assert_eq!(upgraded.plan, Plan::Premium);

    // Re-applying the current plan is a no-op.
    svc.change_plan(client.id, Plan::Premium, Some(operator))
        .await
        .unwrap();

    let events = svc
        .subscription_events(client.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(events.total, 1);
    assert_eq!(
        events.items[0].kind,
        SubscriptionEventKind::PlanChanged {
            from: Plan::Starter,
            to: Plan::Premium,
        }
    );
    assert_eq!(events.items[0].actor, Some(operator));
}

#[tokio::test]
async fn status_changes_leave_an_event_newest_first() {
    let (_db, svc) = setup().await;
    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Starter))
        .await
        .unwrap();

    svc.change_status(client.id, ClientStatus::Active, None)
        .await
        .unwrap();
    let suspended = svc
        .change_status(client.id, ClientStatus::Suspended, None)
        .await
        .unwrap();
    assert_eq!(suspended.status, ClientStatus::Suspended);

    let events = svc
        .subscription_events(client.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(events.total, 2);
    assert_eq!(
        events.items[0].kind,
        SubscriptionEventKind::StatusChanged {
            from: ClientStatus::Active,
            to: ClientStatus::Suspended,
        }
    );
}

#[tokio::test]
async fn renewal_extends_the_period() {
    let (_db, svc) = setup().await;
    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Starter))
        .await
        .unwrap();

    assert!(matches!(
        svc.renew(client.id, Utc::now() - Duration::days(1), None)
            .await
            .unwrap_err(),
        Error::Validation { .. }
    ));

    let period_end = Utc::now() + Duration::days(30);
    let renewed = svc.renew(client.id, period_end, None).await.unwrap();
    let stored = renewed.current_period_end.expect("period end must be set");
    assert_eq!(stored.timestamp(), period_end.timestamp());
    // Renewal never flips the status on its own.
    assert_eq!(renewed.status, ClientStatus::Trial);

    let events = svc
        .subscription_events(client.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(events.total, 1);
    assert!(matches!(
        events.items[0].kind,
        SubscriptionEventKind::Renewed { .. }
    ));
}

#[tokio::test]
async fn unknown_clients_are_not_found() {
    let (_db, svc) = setup().await;
    let missing = Uuid::new_v4();

    assert!(matches!(
        svc.change_plan(missing, Plan::Premium, None).await.unwrap_err(),
        Error::NotFound { .. }
    ));
    assert!(matches!(
        svc.renew(missing, Utc::now() + Duration::days(30), None)
            .await
            .unwrap_err(),
        Error::NotFound { .. }
    ));
    assert!(matches!(
        svc.subscription_events(missing, Pagination::default())
            .await
            .unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn entitlements_reflect_the_plan() {
    let (_db, svc) = setup().await;
    let client = svc
        .create_client(new_client("Da Mario", "da-mario", Plan::Standard))
        .await
        .unwrap();

    let ents = svc.entitlements(client.id).await.unwrap();
    assert!(ents.has_feature(&Feature::KitchenDisplay));
    assert!(!ents.has_feature(&Feature::WaiterBoard));
    assert_eq!(ents.limits.max_menu_items, 200);

    svc.change_plan(client.id, Plan::Premium, None).await.unwrap();
    let ents = svc.entitlements(client.id).await.unwrap();
    assert!(ents.has_feature(&Feature::WaiterBoard));
}

#[tokio::test]
async fn listing_pages_through_clients() {
    let (_db, svc) = setup().await;

    for i in 1..=5 {
        svc.create_client(new_client(
            &format!("Locale {i}"),
            &format!("locale-{i}"),
            Plan::Starter,
        ))
        .await
        .unwrap();
    }

    let page = svc
        .list_clients(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);

    let rest = svc
        .list_clients(Pagination {
            offset: 4,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}
