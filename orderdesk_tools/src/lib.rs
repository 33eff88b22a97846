//! Client library for the OrderDesk order-management service.
//!
//! Two implementations of [`OrderDeskClient`] are provided:
//! * [`OrderDeskApi`] performs real HTTP calls with bounded retry/backoff under rate limiting.
//! * [`CannedOrderDesk`] returns deterministic data and never touches the network. The mode is chosen at
//!   construction time by picking the implementation; it is never inferred from request data.

mod api;
mod canned;
mod config;
mod error;
mod retry;

mod data_objects;

pub use api::OrderDeskApi;
pub use canned::CannedOrderDesk;
pub use config::OrderDeskConfig;
pub use data_objects::{ExternalInvoiceId, InvoiceLinePayload, InvoicePayload, ReferenceLine, ReferenceOrder};
pub use error::OrderDeskApiError;
pub use retry::{AttemptOutcome, RetryPolicy};

/// The behaviour the reconciliation engine needs from the order-management service.
#[allow(async_fn_in_trait)]
pub trait OrderDeskClient {
    /// Fetch the reference order (expected quantities and prices) for the given purchase order number.
    async fn get_reference_order(&self, po_number: &str) -> Result<ReferenceOrder, OrderDeskApiError>;

    /// Post a vendor invoice to the order-management service, returning its external id.
    async fn post_invoice(&self, invoice: &InvoicePayload) -> Result<ExternalInvoiceId, OrderDeskApiError>;
}
