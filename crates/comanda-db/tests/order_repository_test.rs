//! Integration tests for the Order repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use comanda_core::models::client::{CreateClient, Plan};
use comanda_core::models::order::{
    CreateOrder, CreateOrderItem, OrderChannel, OrderItemStatus, OrderStatus,
};
use comanda_core::repository::{ClientRepository, OrderFilter, OrderRepository, Pagination};
use comanda_db::repository::{SurrealClientRepository, SurrealOrderRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanda_db::run_migrations(&db).await.unwrap();

    let client_repo = SurrealClientRepository::new(db.clone());
    let client = client_repo
        .create(CreateClient {
            name: "Osteria Test".into(),
            slug: "osteria-test".into(),
            plan: Plan::Premium,
            contact_email: "osteria@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap();

    (db, client.id)
}

fn line(name: &str, quantity: u32, unit_price_cents: i64) -> CreateOrderItem {
    CreateOrderItem {
        menu_item_id: Uuid::new_v4(),
        name: name.into(),
        quantity,
        unit_price_cents,
        note: None,
    }
}

fn table_order(tenant_id: Uuid, table: &str, items: Vec<CreateOrderItem>) -> CreateOrder {
    CreateOrder {
        tenant_id,
        table_label: Some(table.into()),
        channel: OrderChannel::Counter,
        placed_by: None,
        note: None,
        items,
    }
}

#[tokio::test]
async fn create_order_with_items() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let order = repo
        .create(table_order(
            tenant_id,
            "T4",
            vec![line("Margherita", 2, 850), line("Acqua", 1, 250)],
        ))
        .await
        .unwrap();

    assert_eq!(order.tenant_id, tenant_id);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.table_label.as_deref(), Some("T4"));
    assert_eq!(order.total_cents, 2 * 850 + 250);
    assert_eq!(order.items.len(), 2);
    for item in &order.items {
        assert_eq!(item.status, OrderItemStatus::Queued);
        assert_eq!(item.order_id, order.id);
    }
}

#[tokio::test]
async fn failed_item_write_leaves_no_order_behind() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    // The schema rejects quantity 0, so the second item statement in
    // the batch fails and the whole transaction must roll back.
    let result = repo
        .create(table_order(
            tenant_id,
            "T9",
            vec![line("Margherita", 1, 850), line("Phantom", 0, 400)],
        ))
        .await;
    assert!(result.is_err());

    assert_eq!(repo.count_open(tenant_id).await.unwrap(), 0);
    let all = repo
        .list(tenant_id, OrderFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 0);
    assert!(all.items.is_empty());
}

#[tokio::test]
async fn get_by_id_loads_items_in_creation_order() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let created = repo
        .create(table_order(
            tenant_id,
            "T1",
            vec![
                line("Primo", 1, 900),
                line("Secondo", 1, 1400),
                line("Dolce", 1, 500),
            ],
        ))
        .await
        .unwrap();

    let fetched = repo.get_by_id(tenant_id, created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    let names: Vec<&str> = fetched.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Primo", "Secondo", "Dolce"]);
}

#[tokio::test]
async fn list_filters_by_status() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let first = repo
        .create(table_order(tenant_id, "T1", vec![line("A", 1, 100)]))
        .await
        .unwrap();
    let second = repo
        .create(table_order(tenant_id, "T2", vec![line("B", 1, 200)]))
        .await
        .unwrap();

    repo.set_status(tenant_id, second.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let pending_only = repo
        .list(
            tenant_id,
            OrderFilter {
                statuses: Some(vec![OrderStatus::Pending]),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending_only.total, 1);
    assert_eq!(pending_only.items[0].id, first.id);

    // Unfiltered listing returns everything, oldest first, items loaded.
    let all = repo
        .list(tenant_id, OrderFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.items[0].id, first.id);
    assert_eq!(all.items[1].items.len(), 1);
}

#[tokio::test]
async fn count_open_ignores_terminal_orders() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let a = repo
        .create(table_order(tenant_id, "T1", vec![line("A", 1, 100)]))
        .await
        .unwrap();
    let b = repo
        .create(table_order(tenant_id, "T2", vec![line("B", 1, 200)]))
        .await
        .unwrap();
    repo.create(table_order(tenant_id, "T3", vec![line("C", 1, 300)]))
        .await
        .unwrap();

    assert_eq!(repo.count_open(tenant_id).await.unwrap(), 3);

    repo.set_status(tenant_id, a.id, OrderStatus::Served)
        .await
        .unwrap();
    repo.set_status(tenant_id, b.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(repo.count_open(tenant_id).await.unwrap(), 1);
}

#[tokio::test]
async fn set_status_refuses_foreign_tenant() {
    let (db, tenant_id) = setup().await;

    let client_repo = SurrealClientRepository::new(db.clone());
    let other_tenant = client_repo
        .create(CreateClient {
            name: "Intruder".into(),
            slug: "intruder".into(),
            plan: Plan::Starter,
            contact_email: "intruder@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap()
        .id;

    let repo = SurrealOrderRepository::new(db);
    let order = repo
        .create(table_order(tenant_id, "T1", vec![line("A", 1, 100)]))
        .await
        .unwrap();

    let result = repo
        .set_status(other_tenant, order.id, OrderStatus::Cancelled)
        .await;
    assert!(result.is_err(), "cross-tenant status write must fail");

    // Order is untouched.
    let fetched = repo.get_by_id(tenant_id, order.id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn item_status_updates_are_scoped_to_the_order() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let order = repo
        .create(table_order(
            tenant_id,
            "T1",
            vec![line("A", 1, 100), line("B", 1, 200)],
        ))
        .await
        .unwrap();
    let other = repo
        .create(table_order(tenant_id, "T2", vec![line("C", 1, 300)]))
        .await
        .unwrap();

    let item = &order.items[0];
    repo.set_item_status(tenant_id, order.id, item.id, OrderItemStatus::Preparing)
        .await
        .unwrap();

    let fetched = repo.get_by_id(tenant_id, order.id).await.unwrap();
    assert_eq!(fetched.items[0].status, OrderItemStatus::Preparing);
    assert_eq!(fetched.items[1].status, OrderItemStatus::Queued);

    // Item id under the wrong order is not found.
    let result = repo
        .set_item_status(tenant_id, other.id, item.id, OrderItemStatus::Ready)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cancel_active_items_spares_served_ones() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let order = repo
        .create(table_order(
            tenant_id,
            "T1",
            vec![line("Eaten", 1, 700), line("Never made", 1, 900)],
        ))
        .await
        .unwrap();

    // March the first item through to Served.
    let served = &order.items[0];
    for status in [
        OrderItemStatus::Preparing,
        OrderItemStatus::Ready,
        OrderItemStatus::Served,
    ] {
        repo.set_item_status(tenant_id, order.id, served.id, status)
            .await
            .unwrap();
    }

    repo.cancel_active_items(tenant_id, order.id).await.unwrap();

    let fetched = repo.get_by_id(tenant_id, order.id).await.unwrap();
    assert_eq!(fetched.items[0].status, OrderItemStatus::Served);
    assert_eq!(fetched.items[1].status, OrderItemStatus::Cancelled);
}

#[tokio::test]
async fn set_total_overwrites_stored_total() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let order = repo
        .create(table_order(
            tenant_id,
            "T1",
            vec![line("A", 1, 100), line("B", 1, 200)],
        ))
        .await
        .unwrap();
    assert_eq!(order.total_cents, 300);

    // Item B cancelled; the service recomputes and persists the total.
    repo.set_total(tenant_id, order.id, 100).await.unwrap();

    let fetched = repo.get_by_id(tenant_id, order.id).await.unwrap();
    assert_eq!(fetched.total_cents, 100);
}

#[tokio::test]
async fn sales_summary_counts_only_served_orders_in_window() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let a = repo
        .create(table_order(tenant_id, "T1", vec![line("A", 2, 850)]))
        .await
        .unwrap();
    let b = repo
        .create(table_order(tenant_id, "T2", vec![line("B", 1, 1200)]))
        .await
        .unwrap();
    let c = repo
        .create(table_order(tenant_id, "T3", vec![line("C", 1, 9999)]))
        .await
        .unwrap();

    repo.set_status(tenant_id, a.id, OrderStatus::Served)
        .await
        .unwrap();
    repo.set_status(tenant_id, b.id, OrderStatus::Served)
        .await
        .unwrap();
    repo.set_status(tenant_id, c.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let from = Utc::now() - Duration::hours(1);
    let to = Utc::now() + Duration::hours(1);
    let summary = repo.sales_summary(tenant_id, from, to).await.unwrap();

    assert_eq!(summary.orders_served, 2);
    assert_eq!(summary.gross_cents, 1700 + 1200);
    assert_eq!(summary.average_order_cents, (1700 + 1200) / 2);

    // An empty window reports zeros.
    let empty = repo
        .sales_summary(tenant_id, from - Duration::days(7), from - Duration::days(6))
        .await
        .unwrap();
    assert_eq!(empty.orders_served, 0);
    assert_eq!(empty.gross_cents, 0);
    assert_eq!(empty.average_order_cents, 0);
}
