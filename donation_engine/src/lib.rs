//! Donation Engine
//!
//! The donation engine is the money-movement core of the church payment gateway. Donations enter via an
//! external payment gateway's asynchronous webhooks, fund balances are mutated from several code paths
//! (donation completion, withdrawals, administrative corrections), and a payout beneficiary must satisfy a
//! single-active invariant at all times.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, defined in the `db_types` module, which are public.
//! 2. The engine public API ([`mod@api`]). One API struct per concern: donation flows (initiation and webhook
//!    finalization), withdrawals, beneficiaries, funds, and the fire-and-forget audit logger.
//!
//! The correctness properties this crate is built around:
//! * A fund balance always equals completed donations minus withdrawals and is never negative. Credits and
//!   debits are guarded atomic updates at the storage layer.
//! * A donation transitions out of Pending at most once, atomically with the fund credit, however many times
//!   the gateway delivers (or re-delivers) the outcome.
//! * At most one beneficiary is active; once any exist, exactly one is.
//! * Audit logging can never block or fail a financial operation.
mod api;
mod db;

pub mod db_types;
pub mod helpers;
pub mod traits;

pub use api::{
    audit::{new_audit_channel, AuditLogger, AuditWriter},
    beneficiary_api::BeneficiaryApi,
    donation_flow_api::{
        DonationFlowApi,
        DonationPolicy,
        InitiatedDonation,
        NewDonationRequest,
        PaymentNotification,
        CHARGE_COMPLETED_EVENT,
        CHARGE_FAILED_EVENT,
    },
    fund_api::FundApi,
    withdrawal_api::{AuditContext, WithdrawalApi},
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use traits::{
    AuditManagement,
    BeneficiaryManagement,
    DonationLedgerDatabase,
    FinalizeDonationResult,
    FundManagement,
    GatewayError,
    LedgerError,
    PaymentGateway,
    WebhookOutcome,
};
