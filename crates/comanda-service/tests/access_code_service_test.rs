//! Integration tests for the access code service using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use comanda_core::error::Error;
use comanda_core::models::access_code::{CODE_ALPHABET, CODE_LEN};
use comanda_core::models::client::{ClientStatus, CreateClient, Plan};
use comanda_core::repository::{AccessCodeRepository, ClientRepository, Pagination};
use comanda_db::repository::{
    SurrealAccessCodeRepository, SurrealClientRepository, SurrealSnapshotRepository,
};
use comanda_entitle::EntitlementService;
use comanda_service::{AccessCodeService, MintAccessCode};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Entitle = EntitlementService<SurrealClientRepository<Db>, SurrealSnapshotRepository<Db>>;
type Service = AccessCodeService<SurrealAccessCodeRepository<Db>, Entitle>;

fn service(db: &Surreal<Db>) -> Service {
    AccessCodeService::new(
        SurrealAccessCodeRepository::new(db.clone()),
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
            name: "Pizzeria Lampo".into(),
            slug: "pizzeria-lampo".into(),
            plan,
            contact_email: "lampo@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap();

    (db, client.id)
}

fn mint_input(tenant_id: Uuid, max_uses: u32) -> MintAccessCode {
    MintAccessCode {
        tenant_id,
        label: Some("Table 7".into()),
        max_uses,
        expires_at: None,
    }
}

#[tokio::test]
async fn minted_codes_are_wellformed() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let code = svc.mint(mint_input(tenant_id, 4)).await.unwrap();

    assert_eq!(code.code.len(), CODE_LEN);
    assert!(code.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    assert_eq!(code.label.as_deref(), Some("Table 7"));
    assert_eq!(code.max_uses, 4);
    assert_eq!(code.use_count, 0);
    assert!(!code.revoked);
}

#[tokio::test]
async fn mint_validates_input() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    assert!(matches!(
        svc.mint(mint_input(tenant_id, 0)).await.unwrap_err(),
        Error::Validation { .. }
    ));

    let err = svc
        .mint(MintAccessCode {
            tenant_id,
            label: None,
            max_uses: 1,
            expires_at: Some(Utc::now() - Duration::minutes(5)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn starter_plan_cannot_mint_codes() {
    let (db, tenant_id) = setup(Plan::Starter).await;
    let svc = service(&db);

    let err = svc.mint(mint_input(tenant_id, 1)).await.unwrap_err();
    assert!(matches!(err, Error::FeatureNotAvailable { .. }));

    let raw = SurrealAccessCodeRepository::new(db.clone())
        .list(tenant_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(raw.total, 0);
}

#[tokio::test]
async fn redeem_consumes_uses() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let code = svc.mint(mint_input(tenant_id, 2)).await.unwrap();

    let first = svc.redeem(tenant_id, &code.code).await.unwrap();
    assert_eq!(first.use_count, 1);
    let second = svc.redeem(tenant_id, &code.code).await.unwrap();
    assert_eq!(second.use_count, 2);

    // Exhausted.
    assert!(matches!(
        svc.redeem(tenant_id, &code.code).await.unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn revoked_codes_stop_redeeming() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let code = svc.mint(mint_input(tenant_id, 10)).await.unwrap();
    svc.revoke(tenant_id, code.id).await.unwrap();

    assert!(matches!(
        svc.redeem(tenant_id, &code.code).await.unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn suspended_tenant_cannot_redeem() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let code = svc.mint(mint_input(tenant_id, 10)).await.unwrap();

    SurrealClientRepository::new(db.clone())
        .set_status(tenant_id, ClientStatus::Suspended)
        .await
        .unwrap();

    assert!(matches!(
        svc.redeem(tenant_id, &code.code).await.unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
}

#[tokio::test]
async fn list_returns_minted_codes() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    svc.mint(mint_input(tenant_id, 1)).await.unwrap();
    svc.mint(mint_input(tenant_id, 2)).await.unwrap();

    let page = svc.list(tenant_id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    // Newest first.
    assert_eq!(page.items[0].max_uses, 2);
}
