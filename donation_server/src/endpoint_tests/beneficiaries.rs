use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use donation_engine::{BeneficiaryApi, LedgerError};
use serde_json::json;

use super::{
    helpers::{api_request, beneficiary_fixture, ADMIN_KEY, READ_KEY, WRITE_KEY},
    mocks::{MockBackend, MockGateway},
};
use crate::routes::{
    ActiveBeneficiaryRoute,
    BeneficiariesRoute,
    CreateBeneficiaryRoute,
    DeleteBeneficiaryRoute,
    ToggleBeneficiaryRoute,
};

#[actix_web::test]
async fn create_beneficiary_registers_on_gateway_first() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/beneficiaries").set_json(json!({
        "name": "Church Treasury",
        "phone": "+237670000001",
        "provider": "mtn",
        "country": "CM"
    }));
    let (status, body) = api_request(req, ADMIN_KEY, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("\"gateway_id\":\"ben_123\""), "body was: {body}");
}

#[actix_web::test]
async fn create_beneficiary_requires_super_admin() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/beneficiaries").set_json(json!({
        "name": "Church Treasury",
        "phone": "+237670000001",
        "provider": "mtn",
        "country": "CM"
    }));
    let err = api_request(req, WRITE_KEY, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn list_beneficiaries_with_read_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/beneficiaries");
    let (status, body) = api_request(req, READ_KEY, configure_list).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ben_123"), "body was: {body}");
    assert!(body.contains("ben_456"), "body was: {body}");
}

#[actix_web::test]
async fn active_beneficiary_route_is_not_shadowed_by_id_route() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/beneficiaries/active");
    let (status, body) = api_request(req, READ_KEY, configure_list).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"is_active\":true"), "body was: {body}");
}

#[actix_web::test]
async fn deactivating_only_active_beneficiary_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/beneficiaries/ben_123/toggle");
    let (status, body) = api_request(req, ADMIN_KEY, configure_toggle_conflict).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("only active beneficiary"), "body was: {body}");
}

#[actix_web::test]
async fn deleting_active_beneficiary_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri("/beneficiaries/ben_123");
    let (status, body) = api_request(req, ADMIN_KEY, configure_delete_active).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("cannot be deleted"), "body was: {body}");
}

#[actix_web::test]
async fn deleting_inactive_beneficiary_succeeds() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri("/beneficiaries/ben_456");
    let (status, body) = api_request(req, ADMIN_KEY, configure_delete_inactive).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"gateway_id\":\"ben_456\""), "body was: {body}");
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_beneficiary().returning(|b| {
        let mut beneficiary = beneficiary_fixture(1, &b.gateway_id, true);
        beneficiary.name = b.name;
        Ok((beneficiary, true))
    });
    let mut gateway = MockGateway::new();
    gateway.expect_register_beneficiary().returning(|_| Ok("ben_123".to_string()));
    let api = BeneficiaryApi::new(backend, gateway, donation_engine::AuditLogger::sink());
    cfg.service(CreateBeneficiaryRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}

fn configure_list(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_beneficiaries().returning(|| {
        Ok(vec![beneficiary_fixture(1, "ben_123", true), beneficiary_fixture(2, "ben_456", false)])
    });
    backend.expect_fetch_active_beneficiary().returning(|| Ok(Some(beneficiary_fixture(1, "ben_123", true))));
    let api = BeneficiaryApi::new(backend, MockGateway::new(), donation_engine::AuditLogger::sink());
    cfg.service(ActiveBeneficiaryRoute::<MockBackend, MockGateway>::new())
        .service(BeneficiariesRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api));
}

fn configure_toggle_conflict(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_toggle_beneficiary().returning(|id| {
        Err(LedgerError::Conflict(format!("Beneficiary [{id}] is the only active beneficiary")))
    });
    let api = BeneficiaryApi::new(backend, MockGateway::new(), donation_engine::AuditLogger::sink());
    cfg.service(ToggleBeneficiaryRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}

fn configure_delete_active(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_beneficiary().returning(|id| Ok(Some(beneficiary_fixture(1, id, true))));
    backend.expect_delete_beneficiary().never();
    // The gateway must never be asked to remove a destination we would refuse to drop
    let mut gateway = MockGateway::new();
    gateway.expect_remove_beneficiary().never();
    let api = BeneficiaryApi::new(backend, gateway, donation_engine::AuditLogger::sink());
    cfg.service(DeleteBeneficiaryRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}

fn configure_delete_inactive(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_beneficiary().returning(|id| Ok(Some(beneficiary_fixture(2, id, false))));
    backend.expect_delete_beneficiary().returning(|id| Ok(beneficiary_fixture(2, id, false)));
    let mut gateway = MockGateway::new();
    gateway.expect_remove_beneficiary().returning(|_| Ok(()));
    let api = BeneficiaryApi::new(backend, gateway, donation_engine::AuditLogger::sink());
    cfg.service(DeleteBeneficiaryRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}
