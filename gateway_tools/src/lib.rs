//! HTTP client for the upstream payment gateway.
//!
//! The gateway creates charges (returning a payment URL and an opaque transaction reference), manages payout
//! beneficiaries, and reports charge outcomes asynchronously via signed webhooks. This crate knows the wire
//! format; the donation engine only sees its own gateway contract through the server's adapter.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{
    ChargeRequest,
    ChargeResponse,
    GatewayBeneficiary,
    NewGatewayBeneficiary,
    WebhookData,
    WebhookPayload,
};
pub use error::GatewayApiError;
