use std::fmt::Debug;

use log::*;
use orderdesk_tools::{ExternalInvoiceId, InvoiceLinePayload, InvoicePayload, OrderDeskClient};
use serde_json::json;

use crate::{
    db_types::{ApprovalDecision, Invoice, InvoiceId, InvoiceStatus, LineItem, StatusTrigger},
    events::{ApprovalRequestedEvent, EventProducers, InvoiceResolvedEvent},
    ivr_api::errors::ReconciliationError,
    matching::{match_lines, MatchReport, MatchingConfig},
    traits::{ExtractedFields, InvoiceGatewayDatabase},
};

/// `ReconciliationApi` is the primary API for driving an invoice through its lifecycle in response to
/// document-extraction events and approval callbacks.
pub struct ReconciliationApi<B, C> {
    db: B,
    client: C,
    config: MatchingConfig,
    producers: EventProducers,
}

impl<B, C> Debug for ReconciliationApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, C> ReconciliationApi<B, C> {
    pub fn new(db: B, client: C, config: MatchingConfig, producers: EventProducers) -> Self {
        Self { db, client, config, producers }
    }
}

impl<B, C> ReconciliationApi<B, C>
where
    B: InvoiceGatewayDatabase,
    C: OrderDeskClient,
{
    /// Validates the extractor's output and stores the invoice with its line items.
    ///
    /// Ingestion is idempotent: re-submitting an invoice number that already exists returns the stored record
    /// and `false` in the second parameter, and writes nothing.
    pub async fn process_extracted_invoice(
        &self,
        fields: ExtractedFields,
    ) -> Result<(Invoice, bool), ReconciliationError> {
        let invoice = fields.validate()?;
        let (record, inserted) = self.db.insert_invoice(invoice).await?;
        debug!("🔄️📄️ Invoice [{}] ingested (new: {inserted})", record.invoice_number);
        Ok((record, inserted))
    }

    /// Checks the invoice's line items against its reference purchase order and moves it to `matched` or
    /// `flagged` accordingly.
    ///
    /// The invoice must be in status `new`. If the reference order cannot be fetched, the failure is recorded
    /// in the audit log and the invoice is left untouched so that the check can be retried.
    pub async fn reconcile(&self, id: &InvoiceId) -> Result<(Invoice, MatchReport), ReconciliationError> {
        let invoice = self.db.fetch_invoice(id).await?;
        let items = self.db.fetch_line_items(id).await?;
        let reference = match self.client.get_reference_order(&invoice.po_number).await {
            Ok(reference) => reference,
            Err(e) => {
                if e.is_ambiguous() {
                    warn!(
                        "🔄️📄️ Reference order fetch for invoice [{id}] failed in-flight; the external state of \
                         PO {} is unknown: {e}",
                        invoice.po_number
                    );
                } else {
                    warn!("🔄️📄️ Could not fetch reference order {} for invoice [{id}]: {e}", invoice.po_number);
                }
                let details =
                    json!({ "po_number": invoice.po_number, "error": e.to_string(), "ambiguous": e.is_ambiguous() });
                self.db.record_invoice_event(id, "external_call_failed", details).await?;
                return Err(e.into());
            },
        };
        let invoice_lines = items.iter().map(|item| (item.quantity, item.price)).collect::<Vec<_>>();
        let report = match_lines(&invoice_lines, &reference.lines, &self.config);
        let trigger = if report.matched { StatusTrigger::MatchPassed } else { StatusTrigger::MatchFailed };
        let details = json!({ "po_number": invoice.po_number, "report": report });
        let updated = self.db.apply_transition(id, trigger, details).await?;
        debug!("🔄️📄️ Invoice [{id}] checked against PO {}. Matched: {}", invoice.po_number, report.matched);
        Ok((updated, report))
    }

    /// Moves the invoice to `awaiting_approval` and notifies subscribers that a human decision is needed.
    ///
    /// The event is published only after the transition has committed, so subscribers never see a request for
    /// an invoice that is not actually awaiting approval.
    pub async fn request_approval(&self, id: &InvoiceId) -> Result<Invoice, ReconciliationError> {
        let invoice = self.db.fetch_invoice(id).await?;
        let summary = approval_summary(&invoice);
        let details = json!({ "summary": summary, "channel": "callback" });
        let updated = self.db.apply_transition(id, StatusTrigger::NotificationSent, details).await?;
        let event = ApprovalRequestedEvent::new(updated.clone(), summary);
        for emitter in &self.producers.approval_requested_producer {
            debug!("🔄️📨️ Notifying approval request subscribers for invoice [{id}]");
            emitter.publish_event(event.clone()).await;
        }
        Ok(updated)
    }

    /// Applies an approver's decision from a verified callback.
    ///
    /// The invoice must be in `awaiting_approval`. A re-delivered callback for an already-resolved invoice
    /// surfaces as [`crate::traits::InvoiceGatewayError::InvalidTransition`]; the caller decides how gently to
    /// report that.
    pub async fn handle_approval_callback(
        &self,
        id: &InvoiceId,
        decision: ApprovalDecision,
    ) -> Result<Invoice, ReconciliationError> {
        let details = json!({ "decision": decision, "action_id": decision.action_id() });
        let updated = self.db.apply_transition(id, decision.trigger(), details).await?;
        info!("🔄️🖊️ Invoice [{id}] resolved: {decision}");
        let event = InvoiceResolvedEvent::new(updated.clone(), Some(decision));
        for emitter in &self.producers.invoice_resolved_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(updated)
    }

    /// Moves the invoice to the terminal `error` status, recording the reason in the audit log. Valid from any
    /// non-terminal status.
    pub async fn mark_failed(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, ReconciliationError> {
        warn!("🔄️⛔️ Invoice [{id}] failed unrecoverably: {reason}");
        let details = json!({ "reason": reason });
        let updated = self.db.apply_transition(id, StatusTrigger::UnrecoverableFailure, details).await?;
        let event = InvoiceResolvedEvent::new(updated.clone(), None);
        for emitter in &self.producers.invoice_resolved_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(updated)
    }

    /// Posts an approved invoice to the order-management service and records the assigned external id.
    ///
    /// The invoice must be in status `approved`. Submission does not change the invoice's status; the audit
    /// log carries the submission record.
    pub async fn submit_approved_invoice(&self, id: &InvoiceId) -> Result<ExternalInvoiceId, ReconciliationError> {
        let invoice = self.db.fetch_invoice(id).await?;
        if invoice.status != InvoiceStatus::Approved {
            return Err(ReconciliationError::WrongStatus {
                id: id.clone(),
                required: InvoiceStatus::Approved,
                actual: invoice.status,
            });
        }
        let items = self.db.fetch_line_items(id).await?;
        let payload = build_payload(&invoice, &items);
        let external_id = self.client.post_invoice(&payload).await?;
        info!("🔄️🚀️ Invoice [{id}] submitted. External id: {external_id}");
        let details = json!({ "external_id": external_id });
        self.db.record_invoice_event(id, "submitted", details).await?;
        Ok(external_id)
    }

    /// Returns the invoice's audit trail, oldest first.
    pub async fn audit_trail(&self, id: &InvoiceId) -> Result<Vec<crate::db_types::AuditEntry>, ReconciliationError> {
        let trail = self.db.audit_trail(id).await?;
        Ok(trail)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn approval_summary(invoice: &Invoice) -> String {
    format!(
        "Invoice {} from {} for {} against PO {} needs review",
        invoice.invoice_number, invoice.vendor, invoice.total, invoice.po_number
    )
}

fn build_payload(invoice: &Invoice, items: &[LineItem]) -> InvoicePayload {
    let lines = items
        .iter()
        .map(|item| InvoiceLinePayload {
            description: item.description.clone(),
            quantity: item.quantity,
            price: item.price.to_decimal_string(),
        })
        .collect();
    InvoicePayload {
        vendor: invoice.vendor.clone(),
        invoice_number: invoice.invoice_number.as_str().to_string(),
        invoice_date: invoice.invoice_date.format("%Y-%m-%d").to_string(),
        total: invoice.total.to_decimal_string(),
        po_number: invoice.po_number.clone(),
        lines,
    }
}
