//! # Reconciliation engine public API
//!
//! The `ivr_api` module exposes the programmatic API for the invoice reconciliation engine.
//!
//! * [`recon_api`] is the primary API. It drives an invoice through its lifecycle: ingestion of extracted
//!   fields, the purchase-order check, the approval round-trip, and submission of the approved invoice to the
//!   order-management service.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend implementing [`crate::traits::InvoiceGatewayDatabase`]
//! and a client implementing [`orderdesk_tools::OrderDeskClient`]:
//!
//! ```rust,ignore
//! use invoice_recon_engine::{ReconciliationApi, SqliteDatabase};
//! use orderdesk_tools::{OrderDeskApi, OrderDeskConfig};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let client = OrderDeskApi::new(OrderDeskConfig::new_from_env_or_default())?;
//! let api = ReconciliationApi::new(db, client, MatchingConfig::default(), EventProducers::default());
//! let invoice = api.reconcile(&invoice_id).await?;
//! ```

pub mod errors;
pub mod recon_api;
