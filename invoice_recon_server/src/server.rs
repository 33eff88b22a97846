use std::{pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use invoice_recon_engine::{
    events::{ApprovalRequestedEvent, EventHandlers, EventHooks, EventProducers},
    matching::MatchingConfig,
    ReconciliationApi,
    SqliteDatabase,
};
use log::*;
use orderdesk_tools::{
    CannedOrderDesk,
    ExternalInvoiceId,
    InvoicePayload,
    OrderDeskApi,
    OrderDeskApiError,
    OrderDeskClient,
    ReferenceOrder,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::CallbackAuthMiddlewareFactory,
    routes::{approval_callback, health, ingest_invoice, invoice_history, submit_invoice},
};

/// The OrderDesk client the server was configured with at startup. Actix handlers cannot be generic over the
/// client type, so the two implementations are wrapped in one dispatching enum.
#[derive(Clone)]
pub enum AnyOrderDesk {
    Live(OrderDeskApi),
    Canned(CannedOrderDesk),
}

impl OrderDeskClient for AnyOrderDesk {
    async fn get_reference_order(&self, po_number: &str) -> Result<ReferenceOrder, OrderDeskApiError> {
        match self {
            Self::Live(client) => client.get_reference_order(po_number).await,
            Self::Canned(client) => client.get_reference_order(po_number).await,
        }
    }

    async fn post_invoice(&self, invoice: &InvoicePayload) -> Result<ExternalInvoiceId, OrderDeskApiError> {
        match self {
            Self::Live(client) => client.post_invoice(invoice).await,
            Self::Canned(client) => client.post_invoice(invoice).await,
        }
    }
}

pub type BackendApi = ReconciliationApi<SqliteDatabase, AnyOrderDesk>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let client = build_client(&config)?;
    let handlers = EventHandlers::new(64, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, client, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn build_client(config: &ServerConfig) -> Result<AnyOrderDesk, ServerError> {
    let client = if config.use_canned_orderdesk {
        AnyOrderDesk::Canned(CannedOrderDesk::default())
    } else {
        let api = OrderDeskApi::new(config.orderdesk_config.clone())
            .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        AnyOrderDesk::Live(api)
    };
    Ok(client)
}

/// The default notification hook logs the approval request. Deployments wire a real notification channel in
/// its place.
pub fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_approval_requested(|event: ApprovalRequestedEvent| {
        Box::pin(async move {
            info!("📨️ {} ({} actions offered)", event.summary, event.actions.len());
        }) as Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    client: AnyOrderDesk,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), client.clone(), MatchingConfig::default(), producers.clone());
        let callback_auth =
            CallbackAuthMiddlewareFactory::new(config.callback_secret.clone(), !config.disable_callback_checks);
        let callback_scope = web::scope("").wrap(callback_auth).service(approval_callback);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ivr::access_log"))
            .app_data(web::Data::new(api))
            .service(health)
            .service(ingest_invoice)
            .service(submit_invoice)
            .service(invoice_history)
            .service(callback_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
