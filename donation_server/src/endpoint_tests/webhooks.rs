use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use cpg_common::{Money, Secret};
use donation_engine::{
    db_types::DonationStatus,
    traits::FinalizeDonationResult,
    DonationFlowApi,
    DonationPolicy,
};

use super::{
    helpers::{donation_fixture, public_request},
    mocks::{MockBackend, MockGateway},
};
use crate::{helpers::calculate_hmac, middleware::HmacMiddlewareFactory, webhook_routes::GatewayWebhookRoute};

const WEBHOOK_SECRET: &str = "test-webhook-secret";
const SIGNATURE_HEADER: &str = "X-Gateway-Signature";

const COMPLETED_BODY: &str =
    r#"{"event":"charge.completed","data":{"reference":"gw-ref-0007","amount":5000,"currency":"XAF","status":"successful"}}"#;
const UNKNOWN_EVENT_BODY: &str =
    r#"{"event":"charge.disputed","data":{"reference":"gw-ref-0007","amount":5000,"currency":"XAF","status":"disputed"}}"#;

fn signed_request(body: &'static str) -> TestRequest {
    TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, calculate_hmac(WEBHOOK_SECRET, body.as_bytes())))
        .set_payload(body)
}

#[actix_web::test]
async fn completed_event_credits_fund() {
    let _ = env_logger::try_init().ok();
    let (status, body) = public_request(signed_request(COMPLETED_BODY), configure_completed).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"outcome":"credited","donation_id":7,"fund_id":1}"#);
}

#[actix_web::test]
async fn duplicate_delivery_is_acknowledged_without_effect() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        public_request(signed_request(COMPLETED_BODY), configure_already_finalized).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"outcome":"already_finalized","donation_id":7}"#);
}

#[actix_web::test]
async fn unknown_reference_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        public_request(signed_request(COMPLETED_BODY), configure_unknown_reference).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"outcome":"unknown_reference"}"#);
}

#[actix_web::test]
async fn unrecognized_event_is_ignored() {
    let _ = env_logger::try_init().ok();
    // finalize_donation must not be called for an event we do not understand
    let (status, body) =
        public_request(signed_request(UNKNOWN_EVENT_BODY), configure_no_finalize).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"outcome":"ignored","event":"charge.disputed"}"#);
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(COMPLETED_BODY);
    let err = public_request(req, configure_no_finalize).await.expect_err("Expected error");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn invalid_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, calculate_hmac("wrong-secret", COMPLETED_BODY.as_bytes())))
        .set_payload(COMPLETED_BODY);
    let err = public_request(req, configure_no_finalize).await.expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

fn webhook_scope(cfg: &mut ServiceConfig, backend: MockBackend) {
    let api = DonationFlowApi::new(backend, MockGateway::new(), DonationPolicy::default());
    cfg.service(
        web::scope("/gateway")
            .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), true))
            .service(GatewayWebhookRoute::<MockBackend, MockGateway>::new()),
    )
    .app_data(web::Data::new(api));
}

fn configure_completed(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_finalize_donation().returning(|_, outcome| {
        assert_eq!(outcome, DonationStatus::Complete);
        Ok(FinalizeDonationResult::Completed {
            donation: donation_fixture(7, 1, 5000, DonationStatus::Complete),
            new_balance: Money::from(15_000),
        })
    });
    webhook_scope(cfg, backend);
}

fn configure_already_finalized(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_finalize_donation().returning(|_, _| {
        Ok(FinalizeDonationResult::AlreadyFinalized(donation_fixture(7, 1, 5000, DonationStatus::Complete)))
    });
    webhook_scope(cfg, backend);
}

fn configure_unknown_reference(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_finalize_donation().returning(|_, _| Ok(FinalizeDonationResult::NotFound));
    webhook_scope(cfg, backend);
}

fn configure_no_finalize(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_finalize_donation().never();
    webhook_scope(cfg, backend);
}
