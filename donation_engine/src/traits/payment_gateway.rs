use cpg_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewBeneficiary, PaymentMethod, TransactionRef},
    traits::GatewayError,
};

/// The contract the ledger requires from the upstream payment gateway. The engine never depends on any one
/// gateway's wire format; the server supplies an HTTP implementation and tests supply stubs.
///
/// Implementations own their timeout and bounded-retry policy. They must never be invoked while a database
/// transaction is open.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Creates a charge and returns the gateway-assigned transaction reference plus the URL the donor must
    /// visit to pay.
    async fn create_charge(&self, charge: NewCharge) -> Result<ChargeAuthorization, GatewayError>;

    /// Registers a payout destination on the gateway and returns its gateway-assigned id.
    async fn register_beneficiary(&self, beneficiary: &NewBeneficiary) -> Result<String, GatewayError>;

    /// Removes a payout destination from the gateway.
    async fn remove_beneficiary(&self, gateway_id: &str) -> Result<(), GatewayError>;

    /// Lists all payout destinations the gateway knows about.
    async fn fetch_beneficiaries(&self) -> Result<Vec<GatewayBeneficiaryRecord>, GatewayError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCharge {
    pub amount: Money,
    pub currency: String,
    pub method: PaymentMethod,
    pub description: Option<String>,
}

impl NewCharge {
    pub fn new(amount: Money, currency: String, method: PaymentMethod) -> Self {
        Self { amount, currency, method, description: None }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeAuthorization {
    pub reference: TransactionRef,
    pub payment_url: String,
}

/// A gateway-side beneficiary as reported by the gateway's list endpoint. Used by the resync flow to insert
/// rows missing locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayBeneficiaryRecord {
    pub gateway_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
    pub status: String,
}

impl From<GatewayBeneficiaryRecord> for NewBeneficiary {
    fn from(r: GatewayBeneficiaryRecord) -> Self {
        NewBeneficiary {
            gateway_id: r.gateway_id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            provider: r.provider,
            country: r.country,
            status: r.status,
        }
    }
}
