use std::fmt::Display;

use cpg_common::Money;
use donation_engine::{
    db_types::{NewBeneficiary, NewFund, NewWithdrawal, PaymentMethod, UpdateBeneficiary},
    NewDonationRequest,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The donor-facing donation initiation request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    pub fund_id: i64,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_recurring: bool,
}

fn default_currency() -> String {
    cpg_common::XAF_CURRENCY_CODE.to_string()
}

impl DonationRequest {
    pub fn into_new_donation_request(self) -> Result<NewDonationRequest, ServerError> {
        if self.amount <= 0 {
            return Err(ServerError::InvalidRequestBody(format!(
                "Donation amounts must be positive, not {}",
                self.amount
            )));
        }
        Ok(NewDonationRequest {
            fund_id: self.fund_id,
            amount: Money::from(self.amount),
            currency: self.currency.to_uppercase(),
            method: self.payment_method,
            is_anonymous: self.is_anonymous,
            is_recurring: self.is_recurring,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRequest {
    pub title_en: String,
    pub title_fr: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl From<FundRequest> for NewFund {
    fn from(r: FundRequest) -> Self {
        NewFund { title_en: r.title_en, title_fr: r.title_fr, currency: r.currency.to_uppercase() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub fund_id: i64,
    pub amount: i64,
    pub reason: String,
    #[serde(default)]
    pub reference: Option<String>,
}

impl WithdrawalRequest {
    /// `created_by` comes from the authenticated caller's claims, never from the request body.
    pub fn into_new_withdrawal(self, created_by: &str) -> Result<NewWithdrawal, ServerError> {
        if self.amount <= 0 {
            return Err(ServerError::InvalidRequestBody(format!(
                "Withdrawal amounts must be positive, not {}",
                self.amount
            )));
        }
        if self.reason.trim().is_empty() {
            return Err(ServerError::InvalidRequestBody("A withdrawal requires a reason".to_string()));
        }
        let mut withdrawal =
            NewWithdrawal::new(self.fund_id, Money::from(self.amount), self.reason, created_by.to_string());
        if let Some(reference) = self.reference {
            withdrawal = withdrawal.with_reference(reference);
        }
        Ok(withdrawal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneficiaryRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
}

impl From<BeneficiaryRequest> for NewBeneficiary {
    fn from(r: BeneficiaryRequest) -> Self {
        NewBeneficiary {
            // Assigned by the gateway during registration
            gateway_id: String::default(),
            name: r.name,
            phone: r.phone,
            email: r.email,
            provider: r.provider,
            country: r.country,
            status: "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<BeneficiaryUpdateRequest> for UpdateBeneficiary {
    fn from(r: BeneficiaryUpdateRequest) -> Self {
        UpdateBeneficiary { name: r.name, phone: r.phone, email: r.email, provider: r.provider, country: r.country }
    }
}
