use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    retry::{execute_with_retry, AttemptOutcome, RetryPolicy},
    ExternalInvoiceId,
    InvoicePayload,
    OrderDeskApiError,
    OrderDeskClient,
    OrderDeskConfig,
    ReferenceOrder,
};

/// The live HTTP client for the OrderDesk REST API.
///
/// Every request runs under the bounded retry/backoff loop in [`crate::RetryPolicy`]: rate-limit responses and
/// transport errors are retried with exponential waits, any other error status is surfaced immediately.
#[derive(Clone)]
pub struct OrderDeskApi {
    config: OrderDeskConfig,
    client: Arc<Client>,
    policy: RetryPolicy,
}

impl OrderDeskApi {
    pub fn new(config: OrderDeskConfig) -> Result<Self, OrderDeskApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| OrderDeskApiError::Initialization(e.to_string()))?;
        let policy = RetryPolicy::new(config.max_retries, config.backoff);
        Ok(Self { config, client: Arc::new(client), policy })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends one REST query under the retry policy and returns the response body as JSON.
    ///
    /// A successful response with an unparseable body is wrapped as `{"text": <raw body>}` rather than dropped.
    pub async fn rest_query<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<Value, OrderDeskApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let body = body.as_ref();
        execute_with_retry(&self.policy, || self.attempt(method.clone(), &url, body)).await
    }

    async fn attempt<B: Serialize>(&self, method: Method, url: &str, body: Option<&B>) -> AttemptOutcome<Value> {
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = match req.send().await {
            Ok(r) => r,
            Err(e) => return AttemptOutcome::Transport(e.to_string()),
        };
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return AttemptOutcome::RateLimited;
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return AttemptOutcome::Failed { status: status.as_u16(), message };
        }
        trace!("REST query successful. {status}");
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return AttemptOutcome::Transport(e.to_string()),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(_) => AttemptOutcome::Success(serde_json::json!({ "text": text })),
        }
    }
}

impl OrderDeskClient for OrderDeskApi {
    async fn get_reference_order(&self, po_number: &str) -> Result<ReferenceOrder, OrderDeskApiError> {
        let path = format!("/po/{po_number}");
        debug!("Fetching reference order for PO {po_number}");
        let value = self.rest_query::<()>(Method::GET, &path, None).await?;
        let order =
            serde_json::from_value::<ReferenceOrder>(value).map_err(|e| OrderDeskApiError::JsonError(e.to_string()))?;
        info!("Fetched reference order for PO {po_number} with {} lines", order.lines.len());
        Ok(order)
    }

    async fn post_invoice(&self, invoice: &InvoicePayload) -> Result<ExternalInvoiceId, OrderDeskApiError> {
        #[derive(Deserialize)]
        struct InvoiceResponse {
            external_id: String,
        }
        debug!("Posting invoice {} to OrderDesk", invoice.invoice_number);
        let value = self.rest_query(Method::POST, "/invoice", Some(invoice)).await?;
        let response = serde_json::from_value::<InvoiceResponse>(value)
            .map_err(|e| OrderDeskApiError::JsonError(e.to_string()))?;
        info!("Posted invoice {}. External id: {}", invoice.invoice_number, response.external_id);
        Ok(ExternalInvoiceId(response.external_id))
    }
}
