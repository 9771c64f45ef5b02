use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use donation_engine::{
    db_types::DonationStatus,
    traits::ChargeAuthorization,
    DonationFlowApi,
    DonationPolicy,
};
use serde_json::json;

use super::{
    helpers::{api_request, donation_fixture, fund_fixture, public_request, READ_KEY},
    mocks::{MockBackend, MockGateway},
};
use crate::routes::{DonateRoute, DonationByIdRoute};

#[actix_web::test]
async fn donate_creates_pending_donation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/donate").set_json(json!({
        "fund_id": 1,
        "amount": 5000,
        "payment_method": "mobile_money"
    }));
    let (status, body) = public_request(req, configure_donate).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"payment_url\":\"https://pay.gateway.example/c/abc\""), "body was: {body}");
    assert!(body.contains("\"status\":\"Pending\""), "body was: {body}");
}

#[actix_web::test]
async fn donate_below_minimum_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/donate").set_json(json!({
        "fund_id": 1,
        "amount": 50
    }));
    let (status, body) = public_request(req, configure_donate).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("below the minimum"), "body was: {body}");
}

#[actix_web::test]
async fn donate_unknown_fund_is_404() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/donate").set_json(json!({
        "fund_id": 999,
        "amount": 5000
    }));
    let (status, body) = public_request(req, configure_donate).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Fund 999 does not exist"), "body was: {body}");
}

#[actix_web::test]
async fn donate_nonpositive_amount_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/donate").set_json(json!({
        "fund_id": 1,
        "amount": -100
    }));
    let (status, body) = public_request(req, configure_donate).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("must be positive"), "body was: {body}");
}

#[actix_web::test]
async fn fetch_donation_requires_api_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/donations/42");
    let err = api_request(req, "", configure_fetch).await.expect_err("Expected error");
    assert_eq!(err, "API key required.");
}

#[actix_web::test]
async fn fetch_donation_with_read_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/donations/42");
    let (status, body) = api_request(req, READ_KEY, configure_fetch).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"id\":42"), "body was: {body}");
    assert!(body.contains("\"status\":\"Complete\""), "body was: {body}");
}

fn configure_donate(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_fund().returning(|id| Ok((id == 1).then(|| fund_fixture(1, 10_000))));
    backend.expect_insert_donation().returning(|d| {
        let mut donation = donation_fixture(7, d.fund_id, d.amount.value(), d.status);
        donation.transaction_reference = d.transaction_reference;
        Ok((donation, true))
    });
    let mut gateway = MockGateway::new();
    gateway.expect_create_charge().returning(|_| {
        Ok(ChargeAuthorization {
            reference: "gw-ref-0007".to_string().into(),
            payment_url: "https://pay.gateway.example/c/abc".to_string(),
        })
    });
    let api = DonationFlowApi::new(backend, gateway, DonationPolicy::default());
    cfg.service(DonateRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}

fn configure_fetch(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_donation_by_id().returning(|id| Ok(Some(donation_fixture(id, 1, 5000, DonationStatus::Complete))));
    let gateway = MockGateway::new();
    let api = DonationFlowApi::new(backend, gateway, DonationPolicy::default());
    cfg.service(DonationByIdRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
}
