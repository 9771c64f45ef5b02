//! Adapter between the engine's [`PaymentGateway`] contract and the [`gateway_tools`] HTTP client.
//!
//! The engine never sees the gateway's wire format. This module does the translation in both directions and
//! maps transport errors onto the engine's [`GatewayError`], so retries and timeouts stay inside the client.

use donation_engine::{
    db_types::NewBeneficiary,
    traits::{ChargeAuthorization, GatewayBeneficiaryRecord, NewCharge},
    GatewayError,
    PaymentGateway,
};
use gateway_tools::{
    ChargeRequest,
    GatewayApi,
    GatewayApiError,
    GatewayBeneficiary,
    GatewayConfig,
    NewGatewayBeneficiary,
};
use log::*;

use crate::errors::ServerError;

#[derive(Clone)]
pub struct GatewayClient {
    api: GatewayApi,
}

impl GatewayClient {
    pub fn try_from_config(config: GatewayConfig) -> Result<Self, ServerError> {
        let api = GatewayApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }
}

impl PaymentGateway for GatewayClient {
    async fn create_charge(&self, charge: NewCharge) -> Result<ChargeAuthorization, GatewayError> {
        let request = ChargeRequest {
            amount: charge.amount.value(),
            currency: charge.currency,
            payment_method: charge.method.to_string(),
            description: charge.description,
        };
        let response = self.api.create_charge(request).await.map_err(into_gateway_error)?;
        Ok(ChargeAuthorization { reference: response.reference.into(), payment_url: response.payment_url })
    }

    async fn register_beneficiary(&self, beneficiary: &NewBeneficiary) -> Result<String, GatewayError> {
        let request = NewGatewayBeneficiary {
            name: beneficiary.name.clone(),
            phone: beneficiary.phone.clone(),
            email: beneficiary.email.clone(),
            provider: beneficiary.provider.clone(),
            country: beneficiary.country.clone(),
        };
        let registered = self.api.create_beneficiary(request).await.map_err(into_gateway_error)?;
        Ok(registered.id)
    }

    async fn remove_beneficiary(&self, gateway_id: &str) -> Result<(), GatewayError> {
        self.api.delete_beneficiary(gateway_id).await.map_err(into_gateway_error)
    }

    async fn fetch_beneficiaries(&self) -> Result<Vec<GatewayBeneficiaryRecord>, GatewayError> {
        let records = self.api.fetch_beneficiaries().await.map_err(into_gateway_error)?;
        Ok(records.into_iter().map(into_beneficiary_record).collect())
    }
}

fn into_beneficiary_record(b: GatewayBeneficiary) -> GatewayBeneficiaryRecord {
    GatewayBeneficiaryRecord {
        gateway_id: b.id,
        name: b.name,
        phone: b.phone,
        email: b.email,
        provider: b.provider,
        country: b.country,
        status: b.status,
    }
}

fn into_gateway_error(e: GatewayApiError) -> GatewayError {
    debug!("📡️ Gateway call failed: {e}");
    match e {
        GatewayApiError::QueryError { status, message } if (400..500).contains(&status) => {
            GatewayError::Rejected(format!("Error {status}. {message}"))
        },
        GatewayApiError::JsonError(s) => GatewayError::InvalidResponse(s),
        GatewayApiError::InvalidCurrencyAmount(s) => GatewayError::Rejected(s),
        other => GatewayError::RequestFailed(other.to_string()),
    }
}
