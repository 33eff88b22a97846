use serde_json::Value;
use thiserror::Error;

use crate::db_types::{AuditEntry, Invoice, InvoiceId, LineItem, NewInvoice, StatusTrigger, TransitionError};

/// This trait defines the storage behaviour for backends supporting the invoice reconciliation engine.
///
/// This behaviour includes:
/// * Idempotent ingestion of extracted invoices along with their line items.
/// * Applying lifecycle transitions, with the status update and its audit entry committed in a single
///   transaction. A transition either happens completely (status row updated, audit row appended) or not at
///   all.
/// * Appending free-standing audit events and reading the audit trail back.
#[allow(async_fn_in_trait)]
pub trait InvoiceGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a validated invoice and, in a single atomic transaction, stores the invoice, its line items, and
    /// an `extracted` audit entry. This call is idempotent: re-submitting an invoice number that already
    /// exists leaves the stored record untouched.
    ///
    /// Returns the invoice record and true if it was inserted, or false if it already existed.
    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<(Invoice, bool), InvoiceGatewayError>;

    /// Fetches the invoice with the given invoice number.
    async fn fetch_invoice(&self, id: &InvoiceId) -> Result<Invoice, InvoiceGatewayError>;

    /// Fetches the invoice's line items in position order.
    async fn fetch_line_items(&self, id: &InvoiceId) -> Result<Vec<LineItem>, InvoiceGatewayError>;

    /// Applies the lifecycle transition the trigger implies to the invoice, and appends the paired audit entry
    /// carrying `details`, in one transaction.
    ///
    /// If the invoice's current status does not accept the trigger, the transaction is rolled back and
    /// [`InvoiceGatewayError::InvalidTransition`] is returned; no audit entry is written in that case.
    ///
    /// Returns the invoice record after the transition.
    async fn apply_transition(
        &self,
        id: &InvoiceId,
        trigger: StatusTrigger,
        details: Value,
    ) -> Result<Invoice, InvoiceGatewayError>;

    /// Appends an audit entry for the invoice without touching its status. Used for observations that are not
    /// lifecycle transitions, such as a failed external call.
    async fn record_invoice_event(&self, id: &InvoiceId, kind: &str, details: Value) -> Result<(), InvoiceGatewayError>;

    /// Appends an audit entry that is not tied to any invoice.
    async fn record_system_event(&self, kind: &str, details: Value) -> Result<(), InvoiceGatewayError>;

    /// Returns the invoice's audit entries in insertion order.
    async fn audit_trail(&self, id: &InvoiceId) -> Result<Vec<AuditEntry>, InvoiceGatewayError>;

    /// Closes the connection to the database
    async fn close(&mut self) -> Result<(), InvoiceGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum InvoiceGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invoice {0} does not exist")]
    InvoiceNotFound(InvoiceId),
    #[error("Cannot complete the transition. {0}")]
    InvalidTransition(#[from] TransitionError),
}

impl From<sqlx::Error> for InvoiceGatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
