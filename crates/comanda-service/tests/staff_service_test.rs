//! Integration tests for the staff service using in-memory SurrealDB.

use chrono::{Duration, Utc};
use comanda_core::error::Error;
use comanda_core::models::client::{ClientStatus, CreateClient, Plan};
use comanda_core::models::session::CreateSession;
use comanda_core::models::staff::{CreateStaffUser, StaffRole, StaffStatus, UpdateStaffUser};
use comanda_core::repository::{
    ClientRepository, Pagination, SessionRepository, StaffRepository,
};
use comanda_db::repository::{
    SurrealClientRepository, SurrealSessionRepository, SurrealSnapshotRepository,
    SurrealStaffRepository, verify_password,
};
use comanda_entitle::EntitlementService;
use comanda_service::StaffService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Entitle = EntitlementService<SurrealClientRepository<Db>, SurrealSnapshotRepository<Db>>;
type Service =
    StaffService<SurrealStaffRepository<Db>, SurrealSessionRepository<Db>, Entitle>;

fn service(db: &Surreal<Db>) -> Service {
    StaffService::new(
        SurrealStaffRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
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
            name: "Bistrot Aurora".into(),
            slug: "bistrot-aurora".into(),
            plan,
            contact_email: "aurora@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap();

    (db, client.id)
}

fn new_staff(tenant_id: Uuid, username: &str, role: StaffRole) -> CreateStaffUser {
    CreateStaffUser {
        tenant_id,
        username: username.into(),
        display_name: username.into(),
        password: "correct-horse-battery".into(),
        role,
    }
}

/// Seeds a refresh session so revocation paths have something to kill.
async fn seed_session(db: &Surreal<Db>, tenant_id: Uuid, user_id: Uuid, hash: &str) {
    SurrealSessionRepository::new(db.clone())
        .create(CreateSession {
            tenant_id,
            user_id,
            refresh_token_hash: hash.into(),
            ip_address: None,
            user_agent: None,
            expires_at: Utc::now() + Duration::days(14),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn create_hashes_the_password() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let user = svc
        .create(new_staff(tenant_id, "marta", StaffRole::Cashier))
        .await
        .unwrap();

    assert!(user.password_hash.starts_with("$argon2id$"));
    assert_eq!(user.status, StaffStatus::Active);

    let fetched = svc.get(tenant_id, user.id).await.unwrap();
    assert_eq!(fetched.username, "marta");
    assert_eq!(fetched.role, StaffRole::Cashier);
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let mut blank = new_staff(tenant_id, "marta", StaffRole::Cashier);
    blank.username = "  ".into();
    assert!(matches!(
        svc.create(blank).await.unwrap_err(),
        Error::Validation { .. }
    ));

    let mut short = new_staff(tenant_id, "marta", StaffRole::Cashier);
    short.password = "too-short".into();
    assert!(matches!(
        svc.create(short).await.unwrap_err(),
        Error::Validation { .. }
    ));
}

#[tokio::test]
async fn staff_limit_counts_only_active_accounts() {
    let (db, tenant_id) = setup(Plan::Starter).await;
    let svc = service(&db);

    let first = svc
        .create(new_staff(tenant_id, "staff-1", StaffRole::Cashier))
        .await
        .unwrap();
    for i in 2..=3 {
        svc.create(new_staff(tenant_id, &format!("staff-{i}"), StaffRole::Cashier))
            .await
            .unwrap();
    }

    let err = svc
        .create(new_staff(tenant_id, "staff-4", StaffRole::Cashier))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { max: 3, .. }));

    // Suspended accounts free their seat.
    svc.delete(tenant_id, first.id).await.unwrap();
    svc.create(new_staff(tenant_id, "staff-4", StaffRole::Cashier))
        .await
        .unwrap();
}

#[tokio::test]
async fn suspension_revokes_sessions() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);
    let sessions = SurrealSessionRepository::new(db.clone());

    let user = svc
        .create(new_staff(tenant_id, "piero", StaffRole::Waiter))
        .await
        .unwrap();
    seed_session(&db, tenant_id, user.id, "hash-piero").await;

    let updated = svc
        .update(
            tenant_id,
            user.id,
            UpdateStaffUser {
                status: Some(StaffStatus::Suspended),
                ..UpdateStaffUser::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, StaffStatus::Suspended);

    assert!(matches!(
        sessions
            .get_by_token_hash(tenant_id, "hash-piero")
            .await
            .unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn delete_suspends_and_revokes_sessions() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);
    let sessions = SurrealSessionRepository::new(db.clone());

    let user = svc
        .create(new_staff(tenant_id, "gina", StaffRole::Kitchen))
        .await
        .unwrap();
    seed_session(&db, tenant_id, user.id, "hash-gina").await;

    svc.delete(tenant_id, user.id).await.unwrap();

    let gone = svc.get(tenant_id, user.id).await.unwrap();
    assert_eq!(gone.status, StaffStatus::Suspended);
    assert!(
        sessions
            .get_by_token_hash(tenant_id, "hash-gina")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn password_reset_rehashes_and_revokes_sessions() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);
    let sessions = SurrealSessionRepository::new(db.clone());

    let user = svc
        .create(new_staff(tenant_id, "rocco", StaffRole::Cashier))
        .await
        .unwrap();
    seed_session(&db, tenant_id, user.id, "hash-rocco").await;

    assert!(matches!(
        svc.set_password(tenant_id, user.id, "short").await.unwrap_err(),
        Error::Validation { .. }
    ));

    svc.set_password(tenant_id, user.id, "nuova-parola-lunga")
        .await
        .unwrap();

    let reloaded = svc.get(tenant_id, user.id).await.unwrap();
    assert!(verify_password("nuova-parola-lunga", &reloaded.password_hash, None).unwrap());
    assert!(!verify_password("correct-horse-battery", &reloaded.password_hash, None).unwrap());
    assert!(
        sessions
            .get_by_token_hash(tenant_id, "hash-rocco")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn update_changes_role() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let user = svc
        .create(new_staff(tenant_id, "sandra", StaffRole::Cashier))
        .await
        .unwrap();

    let updated = svc
        .update(
            tenant_id,
            user.id,
            UpdateStaffUser {
                role: Some(StaffRole::Manager),
                ..UpdateStaffUser::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, StaffRole::Manager);
    assert_eq!(updated.status, StaffStatus::Active);

    let page = svc.list(tenant_id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn suspended_tenant_cannot_manage_staff() {
    let (db, tenant_id) = setup(Plan::Standard).await;
    let svc = service(&db);

    let user = svc
        .create(new_staff(tenant_id, "elena", StaffRole::Waiter))
        .await
        .unwrap();

    SurrealClientRepository::new(db.clone())
        .set_status(tenant_id, ClientStatus::Suspended)
        .await
        .unwrap();

    let err = svc
        .update(tenant_id, user.id, UpdateStaffUser::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SubscriptionInactive { .. }));
    assert!(matches!(
        svc.set_password(tenant_id, user.id, "another-long-pass")
            .await
            .unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
    assert!(matches!(
        svc.delete(tenant_id, user.id).await.unwrap_err(),
        Error::SubscriptionInactive { .. }
    ));
}
