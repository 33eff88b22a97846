//! Interface contracts of the reconciliation engine's database backends and upstream document boundary.
//!
//! ## Invoice gateway
//! The [`InvoiceGatewayDatabase`] trait defines the storage behaviour a backend must expose: idempotent invoice
//! ingestion, lifecycle transitions paired atomically with their audit entries, and audit trail queries.
//! Lifecycle rules themselves live on [`crate::db_types::InvoiceStatus`]; backends apply them inside a
//! transaction but never reinterpret them.
//!
//! ## Extraction
//! The [`FieldExtractor`] trait is the seam to whatever produces structured fields from vendor documents.
//! Extractor output is untrusted: every field is optional until [`ExtractedFields::validate`] promotes it into a
//! [`crate::db_types::NewInvoice`].

mod extraction;
mod invoice_gateway_database;

pub use extraction::{ExtractedFields, ExtractedLineItem, ExtractionError, FieldExtractor, ValidationError};
pub use invoice_gateway_database::{InvoiceGatewayDatabase, InvoiceGatewayError};
