//! Endpoint tests for the signed approval callback, running against a real SQLite database.
use actix_web::{http::StatusCode, test, web, App};
use invoice_recon_engine::{
    db_types::{InvoiceId, InvoiceStatus, APPROVE_ACTION_ID},
    events::EventProducers,
    helpers::sign_callback,
    matching::MatchingConfig,
    test_utils::{prepare_test_env, random_db_path},
    traits::{ExtractedFields, ExtractedLineItem},
    ReconciliationApi,
    SqliteDatabase,
};
use ivr_common::Secret;
use orderdesk_tools::CannedOrderDesk;

use crate::{
    data_objects::CallbackPayload,
    middleware::CallbackAuthMiddlewareFactory,
    routes::approval_callback,
    server::{AnyOrderDesk, BackendApi},
};

const SECRET: &str = "endpoint-test-secret";

async fn api_with_invoice_awaiting_approval(number: &str) -> BackendApi {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let client = AnyOrderDesk::Canned(CannedOrderDesk::default());
    let api = ReconciliationApi::new(db, client, MatchingConfig::default(), EventProducers::default());
    let fields = ExtractedFields {
        vendor: Some("Acme Corp".into()),
        invoice_number: Some(number.into()),
        invoice_date: Some("2026-08-01".into()),
        total: Some("995.00".into()),
        po_number: Some("PO-1001".into()),
        line_items: vec![ExtractedLineItem { description: None, quantity: 10.0, price: "99.50".into() }],
    };
    let id = InvoiceId::from(number.to_string());
    api.process_extracted_invoice(fields).await.unwrap();
    api.reconcile(&id).await.unwrap();
    api.request_approval(&id).await.unwrap();
    api
}

#[actix_web::test]
async fn a_correctly_signed_callback_applies_the_decision() {
    let api = api_with_invoice_awaiting_approval("INV-9001").await;
    let auth = CallbackAuthMiddlewareFactory::new(Secret::from(SECRET), true);
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).service(web::scope("").wrap(auth).service(approval_callback)),
    )
    .await;

    let payload = CallbackPayload { action_id: APPROVE_ACTION_ID.into(), value: "INV-9001".into() };
    let body = serde_json::to_string(&payload).unwrap();
    let ts = chrono::Utc::now().timestamp();
    let signature = sign_callback(SECRET, ts, &body);
    let req = test::TestRequest::post()
        .uri("/callback")
        .insert_header(("X-Recon-Signature", signature.clone()))
        .insert_header(("X-Recon-Timestamp", ts.to_string()))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(result["invoice"]["status"], serde_json::json!(InvoiceStatus::Approved));

    // Re-delivering the same (still validly signed) callback is a conflict, not a server fault
    let req = test::TestRequest::post()
        .uri("/callback")
        .insert_header(("X-Recon-Signature", signature))
        .insert_header(("X-Recon-Timestamp", ts.to_string()))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unsigned_callbacks_are_rejected() {
    let api = api_with_invoice_awaiting_approval("INV-9002").await;
    let auth = CallbackAuthMiddlewareFactory::new(Secret::from(SECRET), true);
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).service(web::scope("").wrap(auth).service(approval_callback)),
    )
    .await;

    let payload = CallbackPayload { action_id: APPROVE_ACTION_ID.into(), value: "INV-9002".into() };
    let body = serde_json::to_string(&payload).unwrap();
    let req = test::TestRequest::post()
        .uri("/callback")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();
    // The middleware rejects at the service level, so the error must be rendered to see the status
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn a_tampered_body_is_rejected() {
    let api = api_with_invoice_awaiting_approval("INV-9003").await;
    let auth = CallbackAuthMiddlewareFactory::new(Secret::from(SECRET), true);
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).service(web::scope("").wrap(auth).service(approval_callback)),
    )
    .await;

    let payload = CallbackPayload { action_id: APPROVE_ACTION_ID.into(), value: "INV-9003".into() };
    let body = serde_json::to_string(&payload).unwrap();
    let ts = chrono::Utc::now().timestamp();
    let signature = sign_callback(SECRET, ts, &body);
    // The attacker swaps the approval for a rejection after signing
    let tampered = body.replace(APPROVE_ACTION_ID, "reject_invoice");
    let req = test::TestRequest::post()
        .uri("/callback")
        .insert_header(("X-Recon-Signature", signature))
        .insert_header(("X-Recon-Timestamp", ts.to_string()))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(tampered)
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
}
