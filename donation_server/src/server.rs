use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use donation_engine::{
    new_audit_channel,
    BeneficiaryApi,
    DonationFlowApi,
    FundApi,
    SqliteDatabase,
    WithdrawalApi,
};
use donation_engine::AuditLogger;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::gateway::GatewayClient,
    middleware::{ApiKeyMiddlewareFactory, HmacMiddlewareFactory},
    routes::{
        health,
        ActiveBeneficiaryRoute,
        ActivityForEntityRoute,
        BeneficiariesRoute,
        BeneficiaryByIdRoute,
        CreateBeneficiaryRoute,
        CreateFundRoute,
        CreateWithdrawalRoute,
        DeleteBeneficiaryRoute,
        DeleteWithdrawalRoute,
        DonateRoute,
        DonationByIdRoute,
        DonationsForFundRoute,
        FundByIdRoute,
        FundsRoute,
        SyncBeneficiariesRoute,
        ToggleBeneficiaryRoute,
        UpdateBeneficiaryRoute,
        WithdrawalsForFundRoute,
        WithdrawalsRoute,
    },
    webhook_routes::GatewayWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (audit, writer) = new_audit_channel(db.clone(), 64);
    tokio::spawn(writer.run());
    let srv = create_server_instance(config, db, audit)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    audit: AuditLogger,
) -> Result<actix_web::dev::Server, ServerError> {
    let gateway = GatewayClient::try_from_config(config.gateway_config.clone())?;
    // Pull out what the worker factory needs, so the closure doesn't swallow host and port too.
    let policy = config.donation_policy();
    let options = ServerOptions::from_config(&config);
    let api_keys = config.api_keys.clone();
    let webhook_config = config.webhook_config.clone();
    let srv = HttpServer::new(move || {
        let donations_api = DonationFlowApi::new(db.clone(), gateway.clone(), policy.clone());
        let withdrawals_api = WithdrawalApi::new(db.clone(), audit.clone());
        let beneficiaries_api = BeneficiaryApi::new(db.clone(), gateway.clone(), audit.clone());
        let funds_api = FundApi::new(db.clone(), audit.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(donations_api))
            .app_data(web::Data::new(withdrawals_api))
            .app_data(web::Data::new(beneficiaries_api))
            .app_data(web::Data::new(funds_api))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(options));
        // Routes that require an API key. Role checks are declared per route.
        // NB: "/beneficiaries/active" and "/beneficiaries/sync" must be registered before the
        // "/beneficiaries/{gateway_id}" routes, or the literal segments get captured as ids.
        let api_scope = web::scope("/api")
            .wrap(ApiKeyMiddlewareFactory::new(api_keys.clone()))
            .service(CreateFundRoute::<SqliteDatabase>::new())
            .service(FundsRoute::<SqliteDatabase>::new())
            .service(DonationsForFundRoute::<SqliteDatabase, GatewayClient>::new())
            .service(WithdrawalsForFundRoute::<SqliteDatabase>::new())
            .service(FundByIdRoute::<SqliteDatabase>::new())
            .service(DonationByIdRoute::<SqliteDatabase, GatewayClient>::new())
            .service(CreateWithdrawalRoute::<SqliteDatabase>::new())
            .service(WithdrawalsRoute::<SqliteDatabase>::new())
            .service(DeleteWithdrawalRoute::<SqliteDatabase>::new())
            .service(CreateBeneficiaryRoute::<SqliteDatabase, GatewayClient>::new())
            .service(ActiveBeneficiaryRoute::<SqliteDatabase, GatewayClient>::new())
            .service(SyncBeneficiariesRoute::<SqliteDatabase, GatewayClient>::new())
            .service(BeneficiariesRoute::<SqliteDatabase, GatewayClient>::new())
            .service(ToggleBeneficiaryRoute::<SqliteDatabase, GatewayClient>::new())
            .service(UpdateBeneficiaryRoute::<SqliteDatabase, GatewayClient>::new())
            .service(DeleteBeneficiaryRoute::<SqliteDatabase, GatewayClient>::new())
            .service(BeneficiaryByIdRoute::<SqliteDatabase, GatewayClient>::new())
            .service(ActivityForEntityRoute::<SqliteDatabase>::new());
        // The gateway signs webhook bodies; nothing enters this scope without a valid signature.
        let webhook_scope = web::scope("/gateway")
            .wrap(HmacMiddlewareFactory::new(
                &webhook_config.hmac_header,
                webhook_config.hmac_secret.clone(),
                webhook_config.hmac_checks,
            ))
            .service(GatewayWebhookRoute::<SqliteDatabase, GatewayClient>::new());
        app.service(health)
            .service(DonateRoute::<SqliteDatabase, GatewayClient>::new())
            .service(api_scope)
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
