//! The donation engine public API.
//!
//! One thin API struct per concern, each generic over the backend trait(s) it needs:
//! * [`DonationFlowApi`] — donation initiation and webhook finalization.
//! * [`WithdrawalApi`] — administrative debits.
//! * [`BeneficiaryApi`] — payout destinations and the single-active rule.
//! * [`FundApi`] — fund CRUD and balance queries.
//! * [`AuditLogger`] — fire-and-forget activity recording.
pub mod audit;
pub mod beneficiary_api;
pub mod donation_flow_api;
pub mod fund_api;
pub mod withdrawal_api;
