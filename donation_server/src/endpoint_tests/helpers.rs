use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use cpg_common::{Money, Secret};
use donation_engine::db_types::{Beneficiary, Donation, DonationStatus, Fund, FundStatus, PaymentMethod, Role};
use log::debug;

use crate::{
    config::{ApiKeyEntry, ServerOptions},
    middleware::ApiKeyMiddlewareFactory,
};

pub const READ_KEY: &str = "test-read-key";
pub const WRITE_KEY: &str = "test-write-key";
pub const ADMIN_KEY: &str = "test-admin-key";

// API keys for the test app. DO NOT re-use these keys anywhere.
pub fn test_api_keys() -> Vec<ApiKeyEntry> {
    vec![
        ApiKeyEntry {
            key: Secret::new(READ_KEY.to_string()),
            actor_id: "reader".to_string(),
            roles: vec![Role::ReadAll],
        },
        ApiKeyEntry {
            key: Secret::new(WRITE_KEY.to_string()),
            actor_id: "treasurer".to_string(),
            roles: vec![Role::ReadAll, Role::Write],
        },
        ApiKeyEntry {
            key: Secret::new(ADMIN_KEY.to_string()),
            actor_id: "admin".to_string(),
            roles: vec![Role::ReadAll, Role::Write, Role::SuperAdmin],
        },
    ]
}

/// Sends `req` against an app whose routes are mounted behind the API-key middleware, as they are in
/// production. An empty `api_key` sends the request without the header.
pub async fn api_request(
    mut req: TestRequest,
    api_key: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !api_key.is_empty() {
        req = req.insert_header(("X-Api-Key", api_key));
    }
    // ServerOptions is registered app-wide in production; the audited handlers extract it.
    let app = App::new()
        .app_data(web::Data::new(ServerOptions::default()))
        .service(web::scope("").wrap(ApiKeyMiddlewareFactory::new(test_api_keys())).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Sends `req` against an app with no authentication layer, for the public routes and webhook scope.
pub async fn public_request(
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let app = App::new().app_data(web::Data::new(ServerOptions::default())).configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub fn fund_fixture(id: i64, balance: i64) -> Fund {
    Fund {
        id,
        title_en: "Building fund".to_string(),
        title_fr: "Fonds de construction".to_string(),
        current_amount: Money::from(balance),
        currency: "XAF".to_string(),
        status: FundStatus::Active,
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
    }
}

pub fn donation_fixture(id: i64, fund_id: i64, amount: i64, status: DonationStatus) -> Donation {
    Donation {
        id,
        fund_id,
        amount: Money::from(amount),
        currency: "XAF".to_string(),
        status,
        transaction_reference: format!("gw-ref-{id:04}").into(),
        payment_method: PaymentMethod::MobileMoney,
        is_anonymous: false,
        is_recurring: false,
        created_at: Utc.with_ymd_and_hms(2025, 6, 2, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 6, 2, 10, 30, 0).unwrap(),
    }
}

pub fn beneficiary_fixture(id: i64, gateway_id: &str, is_active: bool) -> Beneficiary {
    Beneficiary {
        id,
        gateway_id: gateway_id.to_string(),
        name: "Church Treasury".to_string(),
        phone: "+237670000001".to_string(),
        email: None,
        provider: "mtn".to_string(),
        country: "CM".to_string(),
        is_active,
        status: "active".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
    }
}
