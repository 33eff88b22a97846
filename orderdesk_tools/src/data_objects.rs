use serde::{Deserialize, Serialize};

/// A single expected line on a reference purchase order.
///
/// Lines are keyed positionally: line *i* of the reference order is compared against line *i* of the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub quantity: f64,
    pub price: f64,
}

/// The external system's record of expected quantities and prices for a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrder {
    #[serde(default)]
    pub po_number: String,
    pub lines: Vec<ReferenceLine>,
}

/// The identifier assigned to an invoice by the order-management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInvoiceId(pub String);

impl std::fmt::Display for ExternalInvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLinePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: f64,
    /// Unit price as a decimal string, e.g. "99.50".
    pub price: String,
}

/// The invoice document posted to `POST /invoice` once it has been approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub vendor: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub total: String,
    pub po_number: String,
    pub lines: Vec<InvoiceLinePayload>,
}
