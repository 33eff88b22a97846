use orderdesk_tools::OrderDeskApiError;
use thiserror::Error;

use crate::{
    db_types::{InvoiceId, InvoiceStatus},
    traits::{InvoiceGatewayError, ValidationError},
};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("The extracted fields could not be validated. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Storage error. {0}")]
    DatabaseError(#[from] InvoiceGatewayError),
    #[error("The order-management service call failed. {0}")]
    OrderDeskError(#[from] OrderDeskApiError),
    #[error("Invoice {id} is in status {actual}, but this operation requires {required}")]
    WrongStatus {
        id: InvoiceId,
        required: InvoiceStatus,
        actual: InvoiceStatus,
    },
}
