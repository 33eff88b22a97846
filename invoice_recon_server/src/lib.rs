//! # Invoice reconciliation server
//! This module hosts the HTTP surface for the reconciliation engine. It is responsible for:
//! * Accepting extracted invoice fields and driving them through the purchase-order check.
//! * Receiving signed approval callbacks from the notification channel and applying the decision.
//! * Submitting approved invoices to the order-management service.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/invoice`: Ingests extracted invoice fields and runs the purchase-order check.
//! * `/callback`: The signed callback route for approval decisions.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
