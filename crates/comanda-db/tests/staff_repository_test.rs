//! Integration tests for the Staff repository using in-memory SurrealDB.

use comanda_core::models::client::{CreateClient, Plan};
use comanda_core::models::staff::{CreateStaffUser, StaffRole, StaffStatus, UpdateStaffUser};
use comanda_core::repository::{ClientRepository, Pagination, StaffRepository};
use comanda_db::repository::{SurrealClientRepository, SurrealStaffRepository, verify_password};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create a client.
async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanda_db::run_migrations(&db).await.unwrap();

    let client_repo = SurrealClientRepository::new(db.clone());
    let client = client_repo
        .create(CreateClient {
            name: "Test Restaurant".into(),
            slug: "test-restaurant".into(),
            plan: Plan::Premium,
            contact_email: "owner@example.com".into(),
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
        password: "SuperSecret123!".into(),
        role,
    }
}

#[tokio::test]
async fn create_and_get_staff() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "alice", StaffRole::Manager))
        .await
        .unwrap();

    assert_eq!(staff.tenant_id, tenant_id);
    assert_eq!(staff.username, "alice");
    assert_eq!(staff.role, StaffRole::Manager);
    assert_eq!(staff.status, StaffStatus::Active);

    // Password should be hashed, not stored in plaintext.
    assert_ne!(staff.password_hash, "SuperSecret123!");
    assert!(staff.password_hash.starts_with("$argon2id$"));

    let fetched = repo.get_by_id(tenant_id, staff.id).await.unwrap();
    assert_eq!(fetched.id, staff.id);
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn password_verification() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "bob", StaffRole::Cashier))
        .await
        .unwrap();

    assert!(verify_password("SuperSecret123!", &staff.password_hash, None).unwrap());
    assert!(!verify_password("WrongPassword", &staff.password_hash, None).unwrap());
}

#[tokio::test]
async fn password_with_pepper() {
    let (db, tenant_id) = setup().await;
    let pepper = "server-secret-pepper".to_string();
    let repo = SurrealStaffRepository::with_pepper(db, pepper.clone());

    let staff = repo
        .create(new_staff(tenant_id, "carol", StaffRole::Kitchen))
        .await
        .unwrap();

    assert!(verify_password("SuperSecret123!", &staff.password_hash, Some(&pepper)).unwrap());
    // Verify without pepper should fail.
    assert!(!verify_password("SuperSecret123!", &staff.password_hash, None).unwrap());
}

#[tokio::test]
async fn get_staff_by_username() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "dave", StaffRole::Waiter))
        .await
        .unwrap();

    let fetched = repo.get_by_username(tenant_id, "dave").await.unwrap();
    assert_eq!(fetched.id, staff.id);
}

#[tokio::test]
async fn update_staff_role_and_status() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "erin", StaffRole::Cashier))
        .await
        .unwrap();

    let updated = repo
        .update(
            tenant_id,
            staff.id,
            UpdateStaffUser {
                display_name: Some("Erin M.".into()),
                role: Some(StaffRole::Manager),
                status: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.display_name, "Erin M.");
    assert_eq!(updated.role, StaffRole::Manager);
    assert_eq!(updated.status, StaffStatus::Active); // unchanged
}

#[tokio::test]
async fn set_password_rotates_hash() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "frank", StaffRole::Cashier))
        .await
        .unwrap();

    repo.set_password(tenant_id, staff.id, "FreshSecret456!")
        .await
        .unwrap();

    let fetched = repo.get_by_id(tenant_id, staff.id).await.unwrap();
    assert_ne!(fetched.password_hash, staff.password_hash);
    assert!(verify_password("FreshSecret456!", &fetched.password_hash, None).unwrap());
    assert!(!verify_password("SuperSecret123!", &fetched.password_hash, None).unwrap());
}

#[tokio::test]
async fn delete_suspends_instead_of_removing() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(new_staff(tenant_id, "grace", StaffRole::Waiter))
        .await
        .unwrap();

    repo.delete(tenant_id, staff.id).await.unwrap();

    // Account should still exist but suspended.
    let fetched = repo.get_by_id(tenant_id, staff.id).await.unwrap();
    assert_eq!(fetched.status, StaffStatus::Suspended);
}

#[tokio::test]
async fn count_active_excludes_suspended() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let keep = repo
        .create(new_staff(tenant_id, "heidi", StaffRole::Owner))
        .await
        .unwrap();
    let leaver = repo
        .create(new_staff(tenant_id, "ivan", StaffRole::Kitchen))
        .await
        .unwrap();

    assert_eq!(repo.count_active(tenant_id).await.unwrap(), 2);

    repo.delete(tenant_id, leaver.id).await.unwrap();

    assert_eq!(repo.count_active(tenant_id).await.unwrap(), 1);
    // The survivor is still listed.
    let page = repo.list(tenant_id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2, "suspended staff stay listed");
    assert!(page.items.iter().any(|s| s.id == keep.id));
}

#[tokio::test]
async fn duplicate_username_rejected_within_tenant() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealStaffRepository::new(db);

    repo.create(new_staff(tenant_id, "judy", StaffRole::Cashier))
        .await
        .unwrap();

    let result = repo
        .create(new_staff(tenant_id, "judy", StaffRole::Waiter))
        .await;

    assert!(result.is_err(), "duplicate username should be rejected");
}

#[tokio::test]
async fn same_username_allowed_across_tenants() {
    let (db, tenant_a) = setup().await;

    let client_repo = SurrealClientRepository::new(db.clone());
    let tenant_b = client_repo
        .create(CreateClient {
            name: "Second Restaurant".into(),
            slug: "second-restaurant".into(),
            plan: Plan::Starter,
            contact_email: "second@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap()
        .id;

    let repo = SurrealStaffRepository::new(db);

    repo.create(new_staff(tenant_a, "mallory", StaffRole::Cashier))
        .await
        .unwrap();
    let second = repo
        .create(new_staff(tenant_b, "mallory", StaffRole::Cashier))
        .await;

    assert!(
        second.is_ok(),
        "username uniqueness is scoped to the tenant"
    );
}

#[tokio::test]
async fn tenant_isolation() {
    let (db, tenant_a) = setup().await;

    let client_repo = SurrealClientRepository::new(db.clone());
    let tenant_b = client_repo
        .create(CreateClient {
            name: "Other Restaurant".into(),
            slug: "other-restaurant".into(),
            plan: Plan::Starter,
            contact_email: "other@example.com".into(),
            currency: None,
            trial_ends_at: None,
            metadata: None,
        })
        .await
        .unwrap()
        .id;

    let repo = SurrealStaffRepository::new(db);
    let staff = repo
        .create(new_staff(tenant_a, "isolated", StaffRole::Owner))
        .await
        .unwrap();

    assert!(repo.get_by_id(tenant_a, staff.id).await.is_ok());
    assert!(
        repo.get_by_id(tenant_b, staff.id).await.is_err(),
        "staff should not be visible from another tenant"
    );
}
