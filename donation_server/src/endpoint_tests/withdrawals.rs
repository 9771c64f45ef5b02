use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use cpg_common::Money;
use donation_engine::{db_types::Withdrawal, LedgerError, WithdrawalApi};
use serde_json::json;

use super::{
    helpers::{api_request, fund_fixture, ADMIN_KEY, READ_KEY, WRITE_KEY},
    mocks::MockBackend,
};
use crate::routes::{CreateWithdrawalRoute, DeleteWithdrawalRoute};

fn withdrawal_fixture(id: i64, fund_id: i64, amount: i64) -> Withdrawal {
    Withdrawal {
        id,
        fund_id,
        amount: Money::from(amount),
        currency: "XAF".to_string(),
        reason: "Roof repairs".to_string(),
        reference: None,
        created_by: "treasurer".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 6, 3, 14, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn create_withdrawal_with_write_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/withdrawals").set_json(json!({
        "fund_id": 1,
        "amount": 6000,
        "reason": "Roof repairs"
    }));
    let (status, body) = api_request(req, WRITE_KEY, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("\"amount\":6000"), "body was: {body}");
    assert!(body.contains("\"created_by\":\"treasurer\""), "body was: {body}");
}

#[actix_web::test]
async fn create_withdrawal_requires_write_role() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/withdrawals").set_json(json!({
        "fund_id": 1,
        "amount": 6000,
        "reason": "Roof repairs"
    }));
    let err = api_request(req, READ_KEY, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn insufficient_funds_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/withdrawals").set_json(json!({
        "fund_id": 1,
        "amount": 20000,
        "reason": "Roof repairs"
    }));
    let (status, body) = api_request(req, WRITE_KEY, configure_insufficient).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Available: 9000 FCFA. Requested: 20000 FCFA"), "body was: {body}");
}

#[actix_web::test]
async fn withdrawal_without_reason_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/withdrawals").set_json(json!({
        "fund_id": 1,
        "amount": 6000,
        "reason": "  "
    }));
    let (status, body) = api_request(req, WRITE_KEY, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("requires a reason"), "body was: {body}");
}

#[actix_web::test]
async fn delete_withdrawal_requires_super_admin() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri("/withdrawals/3");
    let err = api_request(req, WRITE_KEY, configure_delete).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn delete_withdrawal_as_super_admin() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri("/withdrawals/3");
    let (status, body) = api_request(req, ADMIN_KEY, configure_delete).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"id\":3"), "body was: {body}");
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_fund().returning(|id| Ok(Some(fund_fixture(id, 15_000))));
    backend
        .expect_create_withdrawal()
        .returning(|w| Ok((withdrawal_fixture(3, w.fund_id, w.amount.value()), Money::from(9000))));
    let api = WithdrawalApi::new(backend, donation_engine::AuditLogger::sink());
    cfg.service(CreateWithdrawalRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

fn configure_insufficient(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_fund().returning(|id| Ok(Some(fund_fixture(id, 9000))));
    backend.expect_create_withdrawal().returning(|_| {
        Err(LedgerError::InsufficientFunds { available: Money::from(9000), requested: Money::from(20_000) })
    });
    let api = WithdrawalApi::new(backend, donation_engine::AuditLogger::sink());
    cfg.service(CreateWithdrawalRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

fn configure_delete(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_delete_withdrawal().returning(|id| Ok(withdrawal_fixture(id, 1, 6000)));
    let api = WithdrawalApi::new(backend, donation_engine::AuditLogger::sink());
    cfg.service(DeleteWithdrawalRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}
