use serde::{Deserialize, Serialize};

//--------------------------------------      Charges        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// The gateway-assigned transaction reference. Opaque; webhooks quote it back.
    pub reference: String,
    /// Where the donor completes the payment.
    pub payment_url: String,
    pub status: String,
}

//--------------------------------------    Beneficiaries    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGatewayBeneficiary {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayBeneficiary {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
    pub status: String,
}

//--------------------------------------      Webhooks       ---------------------------------------------------------
/// The inbound webhook envelope. `event` names the occurrence ("charge.completed", "charge.failed", or
/// something newer we ignore); `data` quotes the charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}
