use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use invoice_recon_engine::{traits::InvoiceGatewayError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Callback could not be authenticated. {0}")]
    AuthorizationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The invoice cannot accept this action in its current status. {0}")]
    InvalidLifecycleAction(String),
    #[error("The order-management service is unavailable. {0}")]
    UpstreamUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthorizationError(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            // Re-delivered callbacks and out-of-order actions are reported as conflicts, not server faults
            Self::InvalidLifecycleAction(_) => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
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

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::ValidationError(e) => Self::InvalidRequestBody(e.to_string()),
            ReconciliationError::DatabaseError(InvoiceGatewayError::InvoiceNotFound(id)) => {
                Self::NoRecordFound(format!("Invoice {id}"))
            },
            ReconciliationError::DatabaseError(InvoiceGatewayError::InvalidTransition(e)) => {
                Self::InvalidLifecycleAction(e.to_string())
            },
            ReconciliationError::DatabaseError(e) => Self::BackendError(e.to_string()),
            ReconciliationError::OrderDeskError(e) => Self::UpstreamUnavailable(e.to_string()),
            ReconciliationError::WrongStatus { .. } => Self::InvalidLifecycleAction(e.to_string()),
        }
    }
}
