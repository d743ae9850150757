//! Integration tests for the menu service using in-memory SurrealDB.

use comanda_core::error::Error;
use comanda_core::models::client::{ClientStatus, CreateClient, Plan};
use comanda_core::models::menu::{CreateMenuItem, UpdateMenuItem};
use comanda_core::repository::{ClientRepository, Pagination};
use comanda_db::repository::{
    SurrealClientRepository, SurrealMenuItemRepository, SurrealSnapshotRepository,
};
use comanda_entitle::EntitlementService;
use comanda_service::MenuService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Entitle = EntitlementService<SurrealClientRepository<Db>, SurrealSnapshotRepository<Db>>;
type Service = MenuService<SurrealMenuItemRepository<Db>, Entitle>;

fn service(db: &Surreal<Db>) -> Service {
    MenuService::new(
        SurrealMenuItemRepository::new(db.clone()),
        EntitlementService::new(
            SurrealClientRepository::new(db.clone()),
            SurrealSnapshotRepository::new(db.clone()),
        ),
    )
}

async fn setup(plan: Plan) -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanda_db::run_migrations(&db).await.unwrap();

    let client = SurrealClientRepository::new(db.clone())
        .create(CreateClient {
            name: "Trattoria Verde".into(),
            slug: "trattoria-verde".into(),
            plan,
            contact_email: "verde@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap();

    (db, client.id)
}

fn new_item(tenant_id: Uuid, name: &str, price_cents: i64) -> CreateMenuItem {
    CreateMenuItem {
        tenant_id,
        name: name.into(),
        description: None,
        category: Some("Piatti".into()),
        price_cents,
        available: None,
        sort_order: None,
    }
}

#[tokio::test]
async fn create_update_delete_roundtrip() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let item = svc
        .create(new_item(tenant_id, "Lasagne", 1250))
        .await
        .unwrap();
    assert_eq!(item.price_cents, 1250);
    assert!(item.available);

    let updated = svc
        .update(
            tenant_id,
            item.id,
            UpdateMenuItem {
                price_cents: Some(1350),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price_cents, 1350);

    svc.delete(tenant_id, item.id).await.unwrap();
    assert!(matches!(
        svc.get(tenant_id, item.id).await.unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    assert!(matches!(
        svc.create(new_item(tenant_id, "   ", 500)).await.unwrap_err(),
        Error::Validation { .. }
    ));
    assert!(matches!(
        svc.create(new_item(tenant_id, "Gratis?", -100))
            .await
            .unwrap_err(),
        Error::Validation { .. }
    ));
    assert!(matches!(
        svc.update(
            tenant_id,
            Uuid::new_v4(),
            UpdateMenuItem {
                price_cents: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err(),
        Error::Validation { .. }
    ));
}

#[tokio::test]
async fn menu_limit_is_enforced_on_create() {
    // Starter caps the menu at 30 items.
    let (db, tenant_id) = setup(Plan::Starter).await;
    let svc = service(&db);

    for i in 0..30 {
        svc.create(new_item(tenant_id, &format!("Piatto {i}"), 900))
            .await
            .unwrap();
    }

    let err = svc
        .create(new_item(tenant_id, "Uno di troppo", 900))
        .await
        .unwrap_err();
    match err {
        Error::LimitExceeded { max, .. } => assert_eq!(max, 30),
        other => panic!("expected LimitExceeded, got {other:?}"),
    }

    // Deleting makes room again.
    let page = svc.staff_list(tenant_id, Pagination::default()).await.unwrap();
    svc.delete(tenant_id, page.items[0].id).await.unwrap();
    svc.create(new_item(tenant_id, "Al posto suo", 900))
        .await
        .unwrap();
}

#[tokio::test]
async fn customer_menu_hides_unavailable_items() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    svc.create(new_item(tenant_id, "Margherita", 850))
        .await
        .unwrap();
    let sold_out = svc
        .create(new_item(tenant_id, "Tartufo", 1450))
        .await
        .unwrap();
    svc.update(
        tenant_id,
        sold_out.id,
        UpdateMenuItem {
            available: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let customer = svc
        .customer_menu(tenant_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(customer.total, 1);
    assert_eq!(customer.items[0].name, "Margherita");

    let staff = svc
        .staff_list(tenant_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(staff.total, 2);
}

#[tokio::test]
async fn suspended_tenant_menu_goes_dark() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let item = svc
        .create(new_item(tenant_id, "Margherita", 850))
        .await
        .unwrap();

    SurrealClientRepository::new(db.clone())
        .set_status(tenant_id, ClientStatus::Suspended)
        .await
        .unwrap();

    assert!(matches!(
        svc.create(new_item(tenant_id, "Nuovo", 700))
            .await
            .unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
    assert!(matches!(
        svc.update(
            tenant_id,
            item.id,
            UpdateMenuItem {
                price_cents: Some(900),
                ..Default::default()
            },
        )
        .await
        .unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
    assert!(matches!(
        svc.delete(tenant_id, item.id).await.unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
    assert!(matches!(
        svc.customer_menu(tenant_id, Pagination::default())
            .await
            .unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
}

#[tokio::test]
async fn past_due_tenant_keeps_serving_customers() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    svc.create(new_item(tenant_id, "Margherita", 850))
        .await
        .unwrap();

    SurrealClientRepository::new(db.clone())
        .set_status(tenant_id, ClientStatus::PastDue)
        .await
        .unwrap();

    let page = svc
        .customer_menu(tenant_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}
