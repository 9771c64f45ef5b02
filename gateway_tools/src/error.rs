use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl GatewayApiError {
    /// Transport failures and gateway-side 5xx responses are worth retrying; anything the gateway rejected
    /// outright (4xx) is not going to succeed on a replay.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayApiError::RestResponseError(_) => true,
            GatewayApiError::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
