use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use donation_engine::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Insufficient funds. {0}")]
    InsufficientFunds(String),
    #[error("The payment gateway could not complete the request. {0}")]
    GatewayError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Authentication required")]
    Unauthorized,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientFunds(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::FundNotFound(_) |
            LedgerError::DonationNotFound(_) |
            LedgerError::WithdrawalNotFound(_) |
            LedgerError::BeneficiaryNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            LedgerError::Validation(s) => Self::InvalidRequest(s),
            LedgerError::Conflict(s) => Self::Conflict(s),
            LedgerError::DuplicateReference(_) => Self::Conflict(e.to_string()),
            LedgerError::Gateway(g) => Self::GatewayError(g.to_string()),
            LedgerError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
