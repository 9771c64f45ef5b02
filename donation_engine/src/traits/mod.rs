//! Interface contracts for ledger database backends and external collaborators.
//!
//! * [`DonationLedgerDatabase`] defines the highest level of behaviour for backends supporting the donation
//!   engine: idempotent donation inserts, the atomic webhook finalization flow, and withdrawal creation.
//! * [`FundManagement`] owns fund rows and the balance column. All credits and debits go through it.
//! * [`BeneficiaryManagement`] mirrors gateway payout destinations locally and enforces the single-active rule.
//! * [`AuditManagement`] appends activity records. It is only ever called through the fire-and-forget
//!   [`crate::AuditLogger`], never directly from a money-moving code path.
//! * [`PaymentGateway`] is the contract this engine requires from the upstream payment gateway. The server
//!   provides the HTTP implementation; tests provide stubs.
mod audit_management;
mod beneficiary_management;
mod data_objects;
mod donation_ledger;
mod errors;
mod fund_management;
mod payment_gateway;

pub use audit_management::AuditManagement;
pub use beneficiary_management::BeneficiaryManagement;
pub use data_objects::{FinalizeDonationResult, WebhookOutcome};
pub use donation_ledger::DonationLedgerDatabase;
pub use errors::{GatewayError, LedgerError};
pub use fund_management::FundManagement;
pub use payment_gateway::{ChargeAuthorization, GatewayBeneficiaryRecord, NewCharge, PaymentGateway};
