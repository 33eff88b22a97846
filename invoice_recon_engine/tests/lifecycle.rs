//! End-to-end lifecycle tests running against a real SQLite database.
use invoice_recon_engine::{
    db_types::{ApprovalDecision, InvoiceId, InvoiceStatus},
    events::EventProducers,
    matching::MatchingConfig,
    test_utils::{prepare_test_env, random_db_path},
    traits::{ExtractedFields, ExtractedLineItem, InvoiceGatewayError},
    ReconciliationApi,
    ReconciliationError,
    SqliteDatabase,
};
use log::*;
use orderdesk_tools::{
    CannedOrderDesk,
    ExternalInvoiceId,
    InvoicePayload,
    OrderDeskApiError,
    OrderDeskClient,
    ReferenceLine,
    ReferenceOrder,
};

/// A client whose reference-order fetch always fails with a transport error.
#[derive(Debug, Clone)]
struct UnreachableOrderDesk;

impl OrderDeskClient for UnreachableOrderDesk {
    async fn get_reference_order(&self, _po_number: &str) -> Result<ReferenceOrder, OrderDeskApiError> {
        Err(OrderDeskApiError::TransportError("connection refused".to_string()))
    }

    async fn post_invoice(&self, _invoice: &InvoicePayload) -> Result<ExternalInvoiceId, OrderDeskApiError> {
        Err(OrderDeskApiError::TransportError("connection refused".to_string()))
    }
}

fn extracted_invoice(number: &str) -> ExtractedFields {
    ExtractedFields {
        vendor: Some("Acme Corp".into()),
        invoice_number: Some(number.into()),
        invoice_date: Some("2026-08-01".into()),
        total: Some("995.00".into()),
        po_number: Some("PO-1001".into()),
        line_items: vec![ExtractedLineItem { description: Some("Widgets".into()), quantity: 10.0, price: "99.50".into() }],
    }
}

async fn new_api<C: OrderDeskClient>(url: &str, client: C) -> ReconciliationApi<SqliteDatabase, C> {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
    ReconciliationApi::new(db, client, MatchingConfig::default(), EventProducers::default())
}

#[tokio::test]
async fn approved_invoice_runs_the_full_happy_path() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    // The canned reference order carries one line of qty 10.0 at 99.50, matching the extracted invoice exactly
    let api = new_api(&url, CannedOrderDesk::default()).await;
    let id = InvoiceId::from("INV-1001".to_string());

    let (invoice, inserted) = api.process_extracted_invoice(extracted_invoice("INV-1001")).await.unwrap();
    assert!(inserted);
    assert_eq!(invoice.status, InvoiceStatus::New);

    let (invoice, report) = api.reconcile(&id).await.unwrap();
    assert!(report.matched);
    assert_eq!(invoice.status, InvoiceStatus::Matched);

    let invoice = api.request_approval(&id).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::AwaitingApproval);

    let invoice = api.handle_approval_callback(&id, ApprovalDecision::Approve).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Approved);

    let external_id = api.submit_approved_invoice(&id).await.unwrap();
    assert_eq!(external_id, ExternalInvoiceId("OD-INV-42".into()));

    let trail = api.audit_trail(&id).await.unwrap();
    let kinds = trail.iter().map(|e| e.event_kind.as_str()).collect::<Vec<_>>();
    assert_eq!(kinds, vec!["extracted", "po_check", "notification", "callback", "submitted"]);
    info!("🚀️ Happy path complete");
}

#[tokio::test]
async fn out_of_tolerance_invoice_is_flagged_and_can_be_rejected() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let client = CannedOrderDesk::default().with_reference_lines(vec![ReferenceLine { quantity: 12.0, price: 110.0 }]);
    let api = new_api(&url, client).await;
    let id = InvoiceId::from("INV-2002".to_string());

    api.process_extracted_invoice(extracted_invoice("INV-2002")).await.unwrap();
    let (invoice, report) = api.reconcile(&id).await.unwrap();
    assert!(!report.matched);
    assert_eq!(invoice.status, InvoiceStatus::Flagged);

    api.request_approval(&id).await.unwrap();
    let invoice = api.handle_approval_callback(&id, ApprovalDecision::Reject).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Rejected);

    // A rejected invoice cannot be submitted
    let err = api.submit_approved_invoice(&id).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::WrongStatus { .. }));
}

#[tokio::test]
async fn redelivered_callbacks_are_rejected_as_invalid_transitions() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let api = new_api(&url, CannedOrderDesk::default()).await;
    let id = InvoiceId::from("INV-3003".to_string());

    api.process_extracted_invoice(extracted_invoice("INV-3003")).await.unwrap();
    api.reconcile(&id).await.unwrap();
    api.request_approval(&id).await.unwrap();
    api.handle_approval_callback(&id, ApprovalDecision::Approve).await.unwrap();

    // The approver's client retries the callback. The invoice is already resolved, so nothing changes.
    let err = api.handle_approval_callback(&id, ApprovalDecision::Approve).await.unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::DatabaseError(InvoiceGatewayError::InvalidTransition(_))
    ));
    // The retry left no extra audit entries behind
    let trail = api.audit_trail(&id).await.unwrap();
    assert_eq!(trail.len(), 4);
}

#[tokio::test]
async fn ingestion_is_idempotent() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let api = new_api(&url, CannedOrderDesk::default()).await;
    let id = InvoiceId::from("INV-4004".to_string());

    let (first, inserted) = api.process_extracted_invoice(extracted_invoice("INV-4004")).await.unwrap();
    assert!(inserted);
    let (second, inserted) = api.process_extracted_invoice(extracted_invoice("INV-4004")).await.unwrap();
    assert!(!inserted);
    assert_eq!(first.id, second.id);

    let trail = api.audit_trail(&id).await.unwrap();
    assert_eq!(trail.len(), 1, "re-ingestion must not add audit entries");
}

#[tokio::test]
async fn a_failed_reference_fetch_leaves_the_invoice_retryable() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let api = new_api(&url, UnreachableOrderDesk).await;
    let id = InvoiceId::from("INV-5005".to_string());

    api.process_extracted_invoice(extracted_invoice("INV-5005")).await.unwrap();
    let err = api.reconcile(&id).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::OrderDeskError(_)));

    // The failure is in the audit log, flagged as ambiguous, but the invoice is still `new`
    let trail = api.audit_trail(&id).await.unwrap();
    let failure = trail.last().unwrap();
    assert_eq!(failure.event_kind, "external_call_failed");
    assert_eq!(failure.details.0["ambiguous"], serde_json::json!(true));

    // Once the service is reachable again the check succeeds
    let api = new_api(&url, CannedOrderDesk::default()).await;
    let (invoice, report) = api.reconcile(&id).await.unwrap();
    assert!(report.matched);
    assert_eq!(invoice.status, InvoiceStatus::Matched);
}

#[tokio::test]
async fn an_unrecoverable_failure_is_terminal() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let api = new_api(&url, CannedOrderDesk::default()).await;
    let id = InvoiceId::from("INV-6006".to_string());

    api.process_extracted_invoice(extracted_invoice("INV-6006")).await.unwrap();
    api.reconcile(&id).await.unwrap();
    api.request_approval(&id).await.unwrap();
    let invoice = api.mark_failed(&id, "approver account deactivated").await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Error);

    let err = api.handle_approval_callback(&id, ApprovalDecision::Approve).await.unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::DatabaseError(InvoiceGatewayError::InvalidTransition(_))
    ));
}
