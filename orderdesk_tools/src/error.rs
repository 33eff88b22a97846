use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderDeskApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Rate limited by OrderDesk after {attempts} attempts")]
    RateLimitExceeded { attempts: usize },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Transport error talking to OrderDesk: {0}")]
    TransportError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}

impl OrderDeskApiError {
    /// True for errors that indicate the external system's state is unknown and must be reconciled out-of-band.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, OrderDeskApiError::TransportError(_))
    }
}
