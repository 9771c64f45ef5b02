//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use donation_engine::{
    db_types::Role,
    traits::{
        AuditManagement,
        BeneficiaryManagement,
        DonationLedgerDatabase,
        FundManagement,
        PaymentGateway,
    },
    BeneficiaryApi,
    DonationFlowApi,
    FundApi,
    WithdrawalApi,
};
use log::*;

use crate::{
    auth::ApiClaims,
    config::ServerOptions,
    data_objects::{
        BeneficiaryRequest,
        BeneficiaryUpdateRequest,
        DonationRequest,
        FundRequest,
        JsonResponse,
        WithdrawalRequest,
    },
    errors::ServerError,
    helpers::audit_context,
};

/// The union of backend behaviour the donation flow and withdrawal handlers need. Blanket-implemented, so any
/// backend (or mock) satisfying the component traits qualifies.
pub trait LedgerBackend: DonationLedgerDatabase + FundManagement {}
impl<T> LedgerBackend for T where T: DonationLedgerDatabase + FundManagement {}

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Donations  ----------------------------------------------------
route!(donate => Post "/donate" impl LedgerBackend, PaymentGateway);
/// The donor-facing initiation route. Validates the request against the donation policy, creates a charge on
/// the gateway and records the pending donation. Returns the payment URL the donor must visit to pay.
///
/// This route is unauthenticated. Whoever wants to give money may do so.
pub async fn donate<B, G>(
    body: web::Json<DonationRequest>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerBackend,
    G: PaymentGateway,
{
    let request = body.into_inner().into_new_donation_request()?;
    debug!("💻️ POST donate. {} to fund #{}", request.amount, request.fund_id);
    let initiated = api.initiate(request).await?;
    Ok(HttpResponse::Ok().json(initiated))
}

route!(donation_by_id => Get "/donations/{id}" impl LedgerBackend, PaymentGateway where requires [Role::ReadAll]);
pub async fn donation_by_id<B, G>(
    path: web::Path<i64>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerBackend,
    G: PaymentGateway,
{
    let id = path.into_inner();
    debug!("💻️ GET donation #{id}");
    let donation =
        api.donation_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Donation #{id}")))?;
    Ok(HttpResponse::Ok().json(donation))
}

route!(donations_for_fund => Get "/funds/{id}/donations" impl LedgerBackend, PaymentGateway where requires [Role::ReadAll]);
pub async fn donations_for_fund<B, G>(
    path: web::Path<i64>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerBackend,
    G: PaymentGateway,
{
    let fund_id = path.into_inner();
    debug!("💻️ GET donations for fund #{fund_id}");
    let donations = api.donations_for_fund(fund_id).await?;
    Ok(HttpResponse::Ok().json(donations))
}

//----------------------------------------------   Funds  ----------------------------------------------------
route!(create_fund => Post "/funds" impl FundManagement where requires [Role::Write]);
pub async fn create_fund<B: FundManagement>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    body: web::Json<FundRequest>,
    api: web::Data<FundApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ctx = audit_context(&req, &opts);
    let new_fund = body.into_inner().into();
    debug!("💻️ POST create fund by {}", claims.actor_id);
    let fund = api.create(new_fund, &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Created().json(fund))
}

route!(funds => Get "/funds" impl FundManagement where requires [Role::ReadAll]);
pub async fn funds<B: FundManagement>(api: web::Data<FundApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET funds");
    let funds = api.list().await?;
    Ok(HttpResponse::Ok().json(funds))
}

route!(fund_by_id => Get "/funds/{id}" impl FundManagement where requires [Role::ReadAll]);
pub async fn fund_by_id<B: FundManagement>(
    path: web::Path<i64>,
    api: web::Data<FundApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET fund #{id}");
    let fund = api.get(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Fund #{id}")))?;
    Ok(HttpResponse::Ok().json(fund))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
route!(create_withdrawal => Post "/withdrawals" impl LedgerBackend where requires [Role::Write]);
pub async fn create_withdrawal<B: LedgerBackend>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ctx = audit_context(&req, &opts);
    let new_withdrawal = body.into_inner().into_new_withdrawal(&claims.actor_id)?;
    debug!("💻️ POST withdrawal of {} from fund #{} by {}", new_withdrawal.amount, new_withdrawal.fund_id, claims.actor_id);
    let withdrawal = api.create(new_withdrawal, ctx).await?;
    Ok(HttpResponse::Created().json(withdrawal))
}

route!(withdrawals => Get "/withdrawals" impl LedgerBackend where requires [Role::ReadAll]);
pub async fn withdrawals<B: LedgerBackend>(api: web::Data<WithdrawalApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals");
    let withdrawals = api.list().await?;
    Ok(HttpResponse::Ok().json(withdrawals))
}

route!(withdrawals_for_fund => Get "/funds/{id}/withdrawals" impl LedgerBackend where requires [Role::ReadAll]);
pub async fn withdrawals_for_fund<B: LedgerBackend>(
    path: web::Path<i64>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let fund_id = path.into_inner();
    debug!("💻️ GET withdrawals for fund #{fund_id}");
    let withdrawals = api.list_for_fund(fund_id).await?;
    Ok(HttpResponse::Ok().json(withdrawals))
}

route!(delete_withdrawal => Delete "/withdrawals/{id}" impl LedgerBackend where requires [Role::SuperAdmin]);
/// Removes a withdrawal record created in error. The fund debit is NOT reversed; this corrects the paper
/// trail, it does not refund money.
pub async fn delete_withdrawal<B: LedgerBackend>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    path: web::Path<i64>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let ctx = audit_context(&req, &opts);
    debug!("💻️ DELETE withdrawal #{id} by {}", claims.actor_id);
    let withdrawal = api.remove(id, &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

//----------------------------------------------   Beneficiaries  ----------------------------------------------------
route!(create_beneficiary => Post "/beneficiaries" impl BeneficiaryManagement, PaymentGateway where requires [Role::SuperAdmin]);
pub async fn create_beneficiary<B, G>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    body: web::Json<BeneficiaryRequest>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let ctx = audit_context(&req, &opts);
    debug!("💻️ POST create beneficiary by {}", claims.actor_id);
    let beneficiary = api.create(body.into_inner().into(), &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Created().json(beneficiary))
}

route!(beneficiaries => Get "/beneficiaries" impl BeneficiaryManagement, PaymentGateway where requires [Role::ReadAll]);
pub async fn beneficiaries<B, G>(api: web::Data<BeneficiaryApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    debug!("💻️ GET beneficiaries");
    let list = api.list().await?;
    Ok(HttpResponse::Ok().json(list))
}

route!(active_beneficiary => Get "/beneficiaries/active" impl BeneficiaryManagement, PaymentGateway where requires [Role::ReadAll]);
pub async fn active_beneficiary<B, G>(api: web::Data<BeneficiaryApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    debug!("💻️ GET active beneficiary");
    let active =
        api.active().await?.ok_or_else(|| ServerError::NoRecordFound("No active beneficiary".to_string()))?;
    Ok(HttpResponse::Ok().json(active))
}

route!(beneficiary_by_id => Get "/beneficiaries/{gateway_id}" impl BeneficiaryManagement, PaymentGateway where requires [Role::ReadAll]);
pub async fn beneficiary_by_id<B, G>(
    path: web::Path<String>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let gateway_id = path.into_inner();
    debug!("💻️ GET beneficiary [{gateway_id}]");
    let beneficiary = api
        .get(&gateway_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Beneficiary [{gateway_id}]")))?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(update_beneficiary => Patch "/beneficiaries/{gateway_id}" impl BeneficiaryManagement, PaymentGateway where requires [Role::SuperAdmin]);
pub async fn update_beneficiary<B, G>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    path: web::Path<String>,
    body: web::Json<BeneficiaryUpdateRequest>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let gateway_id = path.into_inner();
    let ctx = audit_context(&req, &opts);
    debug!("💻️ PATCH beneficiary [{gateway_id}] by {}", claims.actor_id);
    let beneficiary = api.update(&gateway_id, body.into_inner().into(), &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(toggle_beneficiary => Post "/beneficiaries/{gateway_id}/toggle" impl BeneficiaryManagement, PaymentGateway where requires [Role::SuperAdmin]);
/// Flips the active payout destination. Activating a beneficiary deactivates all others atomically;
/// deactivating the only active one is refused with a 409.
pub async fn toggle_beneficiary<B, G>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    path: web::Path<String>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let gateway_id = path.into_inner();
    let ctx = audit_context(&req, &opts);
    debug!("💻️ POST toggle beneficiary [{gateway_id}] by {}", claims.actor_id);
    let beneficiary = api.toggle(&gateway_id, &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(delete_beneficiary => Delete "/beneficiaries/{gateway_id}" impl BeneficiaryManagement, PaymentGateway where requires [Role::SuperAdmin]);
pub async fn delete_beneficiary<B, G>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    path: web::Path<String>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let gateway_id = path.into_inner();
    let ctx = audit_context(&req, &opts);
    debug!("💻️ DELETE beneficiary [{gateway_id}] by {}", claims.actor_id);
    let beneficiary = api.delete(&gateway_id, &claims.actor_id, ctx).await?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(sync_beneficiaries => Post "/beneficiaries/sync" impl BeneficiaryManagement, PaymentGateway where requires [Role::SuperAdmin]);
/// Backfills local rows for beneficiaries that exist on the gateway but not locally. Never deletes anything.
pub async fn sync_beneficiaries<B, G>(
    req: HttpRequest,
    claims: ApiClaims,
    opts: web::Data<ServerOptions>,
    api: web::Data<BeneficiaryApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    let ctx = audit_context(&req, &opts);
    debug!("💻️ POST sync beneficiaries by {}", claims.actor_id);
    let inserted = api.sync_from_gateway(&claims.actor_id, ctx).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{inserted} beneficiaries synchronized."))))
}

//----------------------------------------------   Activity  ----------------------------------------------------
route!(activity_for_entity => Get "/activity/{entity_type}/{entity_id}" impl AuditManagement where requires [Role::ReadAll]);
pub async fn activity_for_entity<B: AuditManagement>(
    path: web::Path<(String, String)>,
    db: web::Data<B>,
) -> Result<HttpResponse, ServerError> {
    let (entity_type, entity_id) = path.into_inner();
    debug!("💻️ GET activity for {entity_type}/{entity_id}");
    let entries = db.fetch_activity_for_entity(&entity_type, &entity_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(entries))
}
