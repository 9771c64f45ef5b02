use cpg_common::Money;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Fund {0} does not exist")]
    FundNotFound(i64),
    #[error("No donation matches transaction reference [{0}]")]
    DonationNotFound(String),
    #[error("Withdrawal {0} does not exist")]
    WithdrawalNotFound(i64),
    #[error("Beneficiary [{0}] does not exist")]
    BeneficiaryNotFound(String),
    #[error("Insufficient funds. Available: {available}. Requested: {requested}")]
    InsufficientFunds { available: Money, requested: Money },
    #[error("A donation with transaction reference [{0}] already exists")]
    DuplicateReference(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Errors surfaced by the upstream payment gateway contract. Transport failures are retried inside the client
/// implementation; by the time one of these reaches the engine, retries have been exhausted.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    RequestFailed(String),
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Could not interpret gateway response: {0}")]
    InvalidResponse(String),
}
