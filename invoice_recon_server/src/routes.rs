//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are async so that long, non-cpu-bound operations (database and order-management calls) do not
//! block the worker thread.
use actix_web::{get, post, web, HttpResponse, Responder};
use invoice_recon_engine::{
    db_types::{ApprovalDecision, InvoiceId},
    traits::ExtractedFields,
};
use log::*;
use serde_json::json;

use crate::{data_objects::CallbackPayload, errors::ServerError, server::BackendApi};

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Ingests extracted invoice fields, runs the purchase-order check, and asks for a human decision.
///
/// Re-submitting an invoice number that has already been ingested returns the stored record without running
/// the lifecycle again.
#[post("/invoice")]
pub async fn ingest_invoice(
    api: web::Data<BackendApi>,
    body: web::Json<ExtractedFields>,
) -> Result<HttpResponse, ServerError> {
    let fields = body.into_inner();
    let (invoice, inserted) = api.process_extracted_invoice(fields).await?;
    let id = invoice.invoice_number.clone();
    if !inserted {
        debug!("💻️📄️ Invoice [{id}] was already ingested. Returning the stored record.");
        return Ok(HttpResponse::Ok().json(json!({ "invoice": invoice, "new": false })));
    }
    let (_, report) = api.reconcile(&id).await?;
    let invoice = api.request_approval(&id).await?;
    debug!("💻️📄️ Invoice [{id}] ingested and checked. Matched: {}", report.matched);
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice, "new": true, "po_check": report })))
}

/// Applies an approver's decision. The signature middleware has already authenticated the request by the time
/// this handler runs.
#[post("/callback")]
pub async fn approval_callback(
    api: web::Data<BackendApi>,
    body: web::Json<CallbackPayload>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    let decision = ApprovalDecision::from_action_id(&payload.action_id)
        .ok_or_else(|| ServerError::InvalidRequestBody(format!("Unknown action id '{}'", payload.action_id)))?;
    let id = InvoiceId::from(payload.value);
    let invoice = api.handle_approval_callback(&id, decision).await?;
    info!("💻️🖊️ Callback decision for invoice [{id}]: {decision}");
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice })))
}

/// Posts an approved invoice to the order-management service.
#[post("/invoice/{id}/submit")]
pub async fn submit_invoice(
    api: web::Data<BackendApi>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let id = InvoiceId::from(path.into_inner());
    let external_id = api.submit_approved_invoice(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "external_id": external_id })))
}

/// Returns the invoice's audit trail, oldest entry first.
#[get("/invoice/{id}/history")]
pub async fn invoice_history(
    api: web::Data<BackendApi>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let id = InvoiceId::from(path.into_inner());
    let trail = api.audit_trail(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "invoice_number": id, "history": trail })))
}
