use serde::{Deserialize, Serialize};

use crate::db_types::{
    ApprovalDecision,
    Invoice,
    APPROVE_ACTION_ID,
    REJECT_ACTION_ID,
};

/// A single interactive action offered to the approver.
///
/// `value` carries the invoice number as an opaque string. The callback echoes it back verbatim; nothing in
/// the notification channel interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAction {
    pub action_id: String,
    pub label: String,
    pub value: String,
}

/// Fired when a flagged invoice needs a human decision. Subscribers typically render the summary and actions
/// into a notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequestedEvent {
    pub invoice: Invoice,
    /// Human-readable description of why the invoice was flagged.
    pub summary: String,
    pub actions: Vec<CallbackAction>,
}

impl ApprovalRequestedEvent {
    pub fn new(invoice: Invoice, summary: String) -> Self {
        let value = invoice.invoice_number.as_str().to_string();
        let actions = vec![
            CallbackAction { action_id: APPROVE_ACTION_ID.to_string(), label: "Approve".to_string(), value: value.clone() },
            CallbackAction { action_id: REJECT_ACTION_ID.to_string(), label: "Reject".to_string(), value },
        ];
        Self { invoice, summary, actions }
    }
}

/// Fired when an invoice reaches a resolution, either through an approver's decision or automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceResolvedEvent {
    pub invoice: Invoice,
    pub decision: Option<ApprovalDecision>,
}

impl InvoiceResolvedEvent {
    pub fn new(invoice: Invoice, decision: Option<ApprovalDecision>) -> Self {
        Self { invoice, decision }
    }
}
