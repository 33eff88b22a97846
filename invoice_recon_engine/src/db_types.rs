use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use ivr_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------      InvoiceId       --------------------------------------------------------
/// The vendor-assigned invoice number. Unique across the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct InvoiceId(pub String);

impl FromStr for InvoiceId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for InvoiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl InvoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    InvoiceStatus     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// The invoice has been extracted and stored, but not yet checked against its reference order.
    New,
    /// Every line item matched the reference order within tolerance.
    Matched,
    /// At least one line item fell outside tolerance, or the reference order was short.
    Flagged,
    /// A human has been asked to approve or reject the invoice.
    AwaitingApproval,
    /// Terminal: an approver accepted the invoice.
    Approved,
    /// Terminal: an approver rejected the invoice.
    Rejected,
    /// Terminal: an unrecoverable failure occurred while processing the invoice.
    Error,
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceStatus::New => "new",
            InvoiceStatus::Matched => "matched",
            InvoiceStatus::Flagged => "flagged",
            InvoiceStatus::AwaitingApproval => "awaiting_approval",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid invoice status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for InvoiceStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "matched" => Ok(Self::Matched),
            "flagged" => Ok(Self::Flagged),
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "error" => Ok(Self::Error),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl InvoiceStatus {
    /// Terminal statuses accept no further triggers.
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Approved | InvoiceStatus::Rejected | InvoiceStatus::Error)
    }

    /// Applies the transition table. Anything not in the table is rejected.
    ///
    /// | Trigger               | From                 | To                  |
    /// |-----------------------|----------------------|---------------------|
    /// | MatchPassed           | new                  | matched             |
    /// | MatchFailed           | new                  | flagged             |
    /// | NotificationSent      | matched, flagged     | awaiting_approval   |
    /// | ApprovalGranted       | awaiting_approval    | approved            |
    /// | ApprovalDenied        | awaiting_approval    | rejected            |
    /// | UnrecoverableFailure  | any non-terminal     | error               |
    pub fn transition(self, trigger: StatusTrigger) -> Result<InvoiceStatus, TransitionError> {
        use InvoiceStatus::*;
        let next = match (self, trigger) {
            (New, StatusTrigger::MatchPassed) => Matched,
            (New, StatusTrigger::MatchFailed) => Flagged,
            (Matched | Flagged, StatusTrigger::NotificationSent) => AwaitingApproval,
            (AwaitingApproval, StatusTrigger::ApprovalGranted) => Approved,
            (AwaitingApproval, StatusTrigger::ApprovalDenied) => Rejected,
            (s, StatusTrigger::UnrecoverableFailure) if !s.is_terminal() => Error,
            (from, trigger) => return Err(TransitionError { from, trigger }),
        };
        Ok(next)
    }
}

//--------------------------------------    StatusTrigger     --------------------------------------------------------
/// The events that may move an invoice through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTrigger {
    MatchPassed,
    MatchFailed,
    NotificationSent,
    ApprovalGranted,
    ApprovalDenied,
    UnrecoverableFailure,
}

impl Display for StatusTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusTrigger::MatchPassed => "match_passed",
            StatusTrigger::MatchFailed => "match_failed",
            StatusTrigger::NotificationSent => "notification_sent",
            StatusTrigger::ApprovalGranted => "approval_granted",
            StatusTrigger::ApprovalDenied => "approval_denied",
            StatusTrigger::UnrecoverableFailure => "unrecoverable_failure",
        };
        write!(f, "{s}")
    }
}

impl StatusTrigger {
    /// The audit-log event kind recorded alongside the transition this trigger causes.
    pub fn audit_kind(self) -> &'static str {
        match self {
            StatusTrigger::MatchPassed | StatusTrigger::MatchFailed => "po_check",
            StatusTrigger::NotificationSent => "notification",
            StatusTrigger::ApprovalGranted | StatusTrigger::ApprovalDenied => "callback",
            StatusTrigger::UnrecoverableFailure => "failure",
        }
    }
}

/// Rejection of a trigger that is not in the transition table for the invoice's current status.
///
/// Re-delivery of a callback for an already-resolved invoice surfaces as this error; callers should treat that
/// case as a benign no-op signal rather than a hard failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid transition: {trigger} cannot be applied to an invoice in status {from}")]
pub struct TransitionError {
    pub from: InvoiceStatus,
    pub trigger: StatusTrigger,
}

//--------------------------------------   ApprovalDecision   --------------------------------------------------------
/// The action id carried by the "approve" button in the outbound notification.
pub const APPROVE_ACTION_ID: &str = "approve_invoice";
/// The action id carried by the "reject" button in the outbound notification.
pub const REJECT_ACTION_ID: &str = "reject_invoice";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    /// Maps the opaque action identifier from an inbound callback to a decision.
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        match action_id {
            APPROVE_ACTION_ID => Some(Self::Approve),
            REJECT_ACTION_ID => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn action_id(self) -> &'static str {
        match self {
            Self::Approve => APPROVE_ACTION_ID,
            Self::Reject => REJECT_ACTION_ID,
        }
    }

    pub fn trigger(self) -> StatusTrigger {
        match self {
            Self::Approve => StatusTrigger::ApprovalGranted,
            Self::Reject => StatusTrigger::ApprovalDenied,
        }
    }
}

impl Display for ApprovalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

//--------------------------------------       Invoice        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: InvoiceId,
    pub vendor: String,
    pub invoice_date: NaiveDate,
    /// The total the vendor declared on the invoice document.
    pub total: Money,
    /// The reference purchase order this invoice claims to bill against.
    pub po_number: String,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewInvoice      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: InvoiceId,
    pub vendor: String,
    pub invoice_date: NaiveDate,
    pub total: Money,
    pub po_number: String,
    /// Ordered as extracted from the document. Position is significant for matching.
    pub line_items: Vec<NewLineItem>,
}

impl NewInvoice {
    pub fn new(invoice_number: InvoiceId, vendor: String, invoice_date: NaiveDate, total: Money, po_number: String) -> Self {
        Self { invoice_number, vendor, invoice_date, total, po_number, line_items: Vec::new() }
    }

    pub fn with_line_items(mut self, line_items: Vec<NewLineItem>) -> Self {
        self.line_items = line_items;
        self
    }
}

//--------------------------------------       LineItem       --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub invoice_id: i64,
    /// Zero-based index of this line within the invoice.
    pub position: i64,
    pub description: Option<String>,
    pub quantity: f64,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub description: Option<String>,
    pub quantity: f64,
    pub price: Money,
}

impl NewLineItem {
    pub fn new(quantity: f64, price: Money) -> Self {
        Self { description: None, quantity, price }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

//--------------------------------------      AuditEntry      --------------------------------------------------------
/// One immutable record in the append-only audit log.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    /// NULL for system-level events that are not tied to a single invoice.
    pub invoice_id: Option<i64>,
    pub event_kind: String,
    pub details: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub invoice_id: Option<i64>,
    pub event_kind: String,
    pub details: serde_json::Value,
}

impl NewAuditEntry {
    pub fn for_invoice(invoice_id: i64, event_kind: &str, details: serde_json::Value) -> Self {
        Self { invoice_id: Some(invoice_id), event_kind: event_kind.to_string(), details }
    }

    pub fn system(event_kind: &str, details: serde_json::Value) -> Self {
        Self { invoice_id: None, event_kind: event_kind.to_string(), details }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [
            InvoiceStatus::New,
            InvoiceStatus::Matched,
            InvoiceStatus::Flagged,
            InvoiceStatus::AwaitingApproval,
            InvoiceStatus::Approved,
            InvoiceStatus::Rejected,
            InvoiceStatus::Error,
        ] {
            assert_eq!(status.to_string().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("pending".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn happy_path_transitions() {
        let s = InvoiceStatus::New;
        let s = s.transition(StatusTrigger::MatchPassed).unwrap();
        assert_eq!(s, InvoiceStatus::Matched);
        let s = s.transition(StatusTrigger::NotificationSent).unwrap();
        assert_eq!(s, InvoiceStatus::AwaitingApproval);
        let s = s.transition(StatusTrigger::ApprovalGranted).unwrap();
        assert_eq!(s, InvoiceStatus::Approved);
        assert!(s.is_terminal());
    }

    #[test]
    fn flagged_invoices_can_still_be_approved() {
        let s = InvoiceStatus::New.transition(StatusTrigger::MatchFailed).unwrap();
        assert_eq!(s, InvoiceStatus::Flagged);
        let s = s.transition(StatusTrigger::NotificationSent).unwrap();
        let s = s.transition(StatusTrigger::ApprovalDenied).unwrap();
        assert_eq!(s, InvoiceStatus::Rejected);
    }

    #[test]
    fn terminal_statuses_reject_all_triggers() {
        for terminal in [InvoiceStatus::Approved, InvoiceStatus::Rejected, InvoiceStatus::Error] {
            for trigger in [
                StatusTrigger::MatchPassed,
                StatusTrigger::MatchFailed,
                StatusTrigger::NotificationSent,
                StatusTrigger::ApprovalGranted,
                StatusTrigger::ApprovalDenied,
                StatusTrigger::UnrecoverableFailure,
            ] {
                let err = terminal.transition(trigger).unwrap_err();
                assert_eq!(err.from, terminal);
                assert_eq!(err.trigger, trigger);
            }
        }
    }

    #[test]
    fn error_is_reachable_from_any_non_terminal_status() {
        for status in [InvoiceStatus::New, InvoiceStatus::Matched, InvoiceStatus::Flagged, InvoiceStatus::AwaitingApproval] {
            assert_eq!(status.transition(StatusTrigger::UnrecoverableFailure).unwrap(), InvoiceStatus::Error);
        }
    }

    #[test]
    fn out_of_order_triggers_are_rejected() {
        assert!(InvoiceStatus::New.transition(StatusTrigger::NotificationSent).is_err());
        assert!(InvoiceStatus::New.transition(StatusTrigger::ApprovalGranted).is_err());
        assert!(InvoiceStatus::Matched.transition(StatusTrigger::MatchPassed).is_err());
        assert!(InvoiceStatus::AwaitingApproval.transition(StatusTrigger::MatchFailed).is_err());
    }

    #[test]
    fn decisions_map_to_and_from_action_ids() {
        assert_eq!(ApprovalDecision::from_action_id("approve_invoice"), Some(ApprovalDecision::Approve));
        assert_eq!(ApprovalDecision::from_action_id("reject_invoice"), Some(ApprovalDecision::Reject));
        assert_eq!(ApprovalDecision::from_action_id("escalate_invoice"), None);
        assert_eq!(ApprovalDecision::Approve.trigger(), StatusTrigger::ApprovalGranted);
        assert_eq!(ApprovalDecision::Reject.trigger(), StatusTrigger::ApprovalDenied);
    }
}
