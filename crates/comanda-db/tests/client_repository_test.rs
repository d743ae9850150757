//! Integration tests for the Client repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use comanda_core::models::client::{ClientStatus, CreateClient, Plan, UpdateClient};
use comanda_core::repository::{ClientRepository, Pagination};
use comanda_db::repository::SurrealClientRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanda_db::run_migrations(&db).await.unwrap();
    db
}

fn new_client(name: &str, slug: &str, plan: Plan) -> CreateClient {
    CreateClient {
        name: name.into(),
        slug: slug.into(),
        plan,
        contact_email: format!("{slug}@example.com"),
        currency: None,
        trial_ends_at: None,
        metadata: None,
    }
}

#[tokio::test]
async fn create_and_get_client() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    let client = repo
        .create(new_client("Trattoria Da Mario", "da-mario", Plan::Standard))
        .await
        .unwrap();

    assert_eq!(client.name, "Trattoria Da Mario");
    assert_eq!(client.slug, "da-mario");
    assert_eq!(client.plan, Plan::Standard);
    // New clients always start in trial.
    assert_eq!(client.status, ClientStatus::Trial);
    assert_eq!(client.currency, "EUR");
    assert!(client.current_period_end.is_none());

    let fetched = repo.get_by_id(client.id).await.unwrap();
    assert_eq!(fetched.id, client.id);
    assert_eq!(fetched.name, "Trattoria Da Mario");
}

#[tokio::test]
async fn get_client_by_slug() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    let client = repo
        .create(new_client("Sushi Kǒu", "sushi-kou", Plan::Starter))
        .await
        .unwrap();

    let fetched = repo.get_by_slug("sushi-kou").await.unwrap();
    assert_eq!(fetched.id, client.id);

    let missing = repo.get_by_slug("no-such-place").await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn duplicate_slug_rejected() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    repo.create(new_client("First", "the-corner", Plan::Starter))
        .await
        .unwrap();

    let result = repo
        .create(new_client("Second", "the-corner", Plan::Premium))
        .await;

    assert!(result.is_err(), "duplicate slug should be rejected");
}

#[tokio::test]
async fn update_client_contact_fields() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    let client = repo
        .create(new_client("Old Name", "renamed", Plan::Starter))
        .await
        .unwrap();

    let updated = repo
        .update(
            client.id,
            UpdateClient {
                name: Some("New Name".into()),
                currency: Some("GBP".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.currency, "GBP");
    assert_eq!(updated.contact_email, "renamed@example.com"); // unchanged
    // Slug is immutable; update has no way to touch it.
    assert_eq!(updated.slug, "renamed");
}

#[tokio::test]
async fn plan_and_status_setters() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    let client = repo
        .create(new_client("Upgrader", "upgrader", Plan::Starter))
        .await
        .unwrap();

    let upgraded = repo.set_plan(client.id, Plan::Premium).await.unwrap();
    assert_eq!(upgraded.plan, Plan::Premium);

    let activated = repo
        .set_status(client.id, ClientStatus::Active)
        .await
        .unwrap();
    assert_eq!(activated.status, ClientStatus::Active);
    assert_eq!(activated.plan, Plan::Premium, "plan change must stick");
}

#[tokio::test]
async fn renew_extends_period_end() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    let client = repo
        .create(new_client("Renewer", "renewer", Plan::Standard))
        .await
        .unwrap();
    assert!(client.current_period_end.is_none());

    let period_end = Utc::now() + Duration::days(30);
    let renewed = repo.renew(client.id, period_end).await.unwrap();

    let stored = renewed.current_period_end.expect("period end must be set");
    // SurrealDB stores nanosecond datetimes; compare at second precision.
    assert_eq!(stored.timestamp(), period_end.timestamp());
}

#[tokio::test]
async fn list_clients_with_pagination() {
    let db = setup().await;
    let repo = SurrealClientRepository::new(db);

    for i in 0..5 {
        repo.create(new_client(
            &format!("Place {i}"),
            &format!("place-{i}"),
            Plan::Starter,
        ))
        .await
        .unwrap();
    }

    let page1 = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);
}
