//! Beneficiary single-active invariant tests against a real SQLite database and a stub gateway.

use donation_engine::{
    db_types::NewBeneficiary,
    AuditContext,
    AuditLogger,
    BeneficiaryApi,
    LedgerError,
    PaymentGateway,
    SqliteDatabase,
};
use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    StubGateway,
};

mod support;

fn new_beneficiary(name: &str, phone: &str) -> NewBeneficiary {
    NewBeneficiary {
        gateway_id: String::new(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        provider: "mtn_momo".to_string(),
        country: "CM".to_string(),
        status: "pending".to_string(),
    }
}

async fn new_api() -> (SqliteDatabase, StubGateway, BeneficiaryApi<SqliteDatabase, StubGateway>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let gateway = StubGateway::new();
    let api = BeneficiaryApi::new(db.clone(), gateway.clone(), AuditLogger::sink());
    (db, gateway, api)
}

#[tokio::test]
async fn first_beneficiary_becomes_active() {
    let (_db, _gateway, api) = new_api().await;
    let first = api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .expect("Error creating beneficiary");
    assert!(first.is_active);
    assert!(!first.gateway_id.is_empty(), "gateway must assign the id");

    let second = api.create(new_beneficiary("Backup Account", "+237650000002"), "admin", AuditContext::default())
        .await
        .unwrap();
    assert!(!second.is_active);

    let active = api.active().await.unwrap().expect("One beneficiary must be active");
    assert_eq!(active.gateway_id, first.gateway_id);
}

#[tokio::test]
async fn activating_a_beneficiary_deactivates_the_previous_one() {
    let (_db, _gateway, api) = new_api().await;
    let first = api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .unwrap();
    let second = api.create(new_beneficiary("Backup Account", "+237650000002"), "admin", AuditContext::default())
        .await
        .unwrap();

    let toggled = api.toggle(&second.gateway_id, "admin", AuditContext::default()).await.unwrap();
    assert!(toggled.is_active);

    let all = api.list().await.unwrap();
    let active: Vec<_> = all.iter().filter(|b| b.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].gateway_id, second.gateway_id);
    assert!(!api.get(&first.gateway_id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn deactivating_the_only_active_beneficiary_is_a_conflict() {
    let (_db, _gateway, api) = new_api().await;
    let only = api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .unwrap();

    let err = api.toggle(&only.gateway_id, "admin", AuditContext::default()).await.expect_err("Must be refused");
    assert!(matches!(err, LedgerError::Conflict(_)), "unexpected error: {err}");
    assert!(api.active().await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn the_active_beneficiary_cannot_be_deleted() {
    let (_db, gateway, api) = new_api().await;
    let active = api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .unwrap();

    let err = api.delete(&active.gateway_id, "admin", AuditContext::default()).await.expect_err("Must be refused");
    assert!(matches!(err, LedgerError::Conflict(_)), "unexpected error: {err}");
    // The refusal happens locally; the gateway still knows the beneficiary.
    assert_eq!(gateway.fetch_beneficiaries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn inactive_beneficiaries_are_deleted_on_both_sides() {
    let (_db, gateway, api) = new_api().await;
    api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .unwrap();
    let inactive = api.create(new_beneficiary("Old Account", "+237650000002"), "admin", AuditContext::default())
        .await
        .unwrap();

    api.delete(&inactive.gateway_id, "admin", AuditContext::default()).await.expect("Error deleting beneficiary");
    assert!(api.get(&inactive.gateway_id).await.unwrap().is_none());
    assert_eq!(gateway.fetch_beneficiaries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sync_inserts_only_the_missing_records() {
    let (_db, gateway, api) = new_api().await;
    let mirrored = api.create(new_beneficiary("Church Treasury", "+237650000001"), "admin", AuditContext::default())
        .await
        .unwrap();
    gateway.seed_beneficiary("ben_seeded_01", "Legacy Account");
    gateway.seed_beneficiary("ben_seeded_02", "Second Legacy Account");

    let inserted = api.sync_from_gateway("admin", AuditContext::default()).await.expect("Error syncing");
    assert_eq!(inserted, 2);
    assert_eq!(api.list().await.unwrap().len(), 3);
    // The pre-existing mirror is untouched and still the single active one.
    let active = api.active().await.unwrap().unwrap();
    assert_eq!(active.gateway_id, mirrored.gateway_id);

    // A second sync finds nothing new.
    let inserted = api.sync_from_gateway("admin", AuditContext::default()).await.unwrap();
    assert_eq!(inserted, 0);
}
