//! `SqliteDatabase` is a concrete implementation of a reconciliation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use serde_json::Value;
use sqlx::SqlitePool;

use super::db::{audit, db_url, invoices, line_items, new_pool};
use crate::{
    db_types::{AuditEntry, Invoice, InvoiceId, LineItem, NewAuditEntry, NewInvoice, StatusTrigger},
    traits::{InvoiceGatewayDatabase, InvoiceGatewayError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl InvoiceGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<(Invoice, bool), InvoiceGatewayError> {
        let mut tx = self.pool.begin().await?;
        let (record, inserted) = invoices::idempotent_insert(&invoice, &mut tx).await?;
        if inserted {
            line_items::insert_line_items(record.id, &invoice.line_items, &mut tx).await?;
            let details = serde_json::json!({
                "vendor": record.vendor,
                "po_number": record.po_number,
                "line_count": invoice.line_items.len(),
            });
            audit::insert_entry(NewAuditEntry::for_invoice(record.id, "extracted", details), &mut tx).await?;
            debug!("🗃️ Invoice [{}] stored with {} line items", record.invoice_number, invoice.line_items.len());
        } else {
            debug!("🗃️ Invoice [{}] already exists. Nothing was written", record.invoice_number);
        }
        tx.commit().await?;
        Ok((record, inserted))
    }

    async fn fetch_invoice(&self, id: &InvoiceId) -> Result<Invoice, InvoiceGatewayError> {
        let mut conn = self.pool.acquire().await?;
        invoices::fetch_invoice_by_number(id, &mut conn)
            .await?
            .ok_or_else(|| InvoiceGatewayError::InvoiceNotFound(id.clone()))
    }

    async fn fetch_line_items(&self, id: &InvoiceId) -> Result<Vec<LineItem>, InvoiceGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::fetch_invoice_by_number(id, &mut conn)
            .await?
            .ok_or_else(|| InvoiceGatewayError::InvoiceNotFound(id.clone()))?;
        let items = line_items::fetch_line_items(invoice.id, &mut conn).await?;
        Ok(items)
    }

    async fn apply_transition(
        &self,
        id: &InvoiceId,
        trigger: StatusTrigger,
        details: Value,
    ) -> Result<Invoice, InvoiceGatewayError> {
        let mut tx = self.pool.begin().await?;
        let invoice = invoices::fetch_invoice_by_number(id, &mut tx)
            .await?
            .ok_or_else(|| InvoiceGatewayError::InvoiceNotFound(id.clone()))?;
        // An invalid transition returns here before anything is written, so the rollback on drop is a no-op.
        let next = invoice.status.transition(trigger)?;
        let updated = invoices::update_status(invoice.id, next, &mut tx).await?;
        audit::insert_entry(NewAuditEntry::for_invoice(invoice.id, trigger.audit_kind(), details), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Invoice [{}] moved from {} to {next} on {trigger:?}", updated.invoice_number, invoice.status);
        Ok(updated)
    }

    async fn record_invoice_event(&self, id: &InvoiceId, kind: &str, details: Value) -> Result<(), InvoiceGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::fetch_invoice_by_number(id, &mut conn)
            .await?
            .ok_or_else(|| InvoiceGatewayError::InvoiceNotFound(id.clone()))?;
        audit::insert_entry(NewAuditEntry::for_invoice(invoice.id, kind, details), &mut conn).await
    }

    async fn record_system_event(&self, kind: &str, details: Value) -> Result<(), InvoiceGatewayError> {
        let mut conn = self.pool.acquire().await?;
        audit::insert_entry(NewAuditEntry::system(kind, details), &mut conn).await
    }

    async fn audit_trail(&self, id: &InvoiceId) -> Result<Vec<AuditEntry>, InvoiceGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::fetch_invoice_by_number(id, &mut conn)
            .await?
            .ok_or_else(|| InvoiceGatewayError::InvoiceNotFound(id.clone()))?;
        let entries = audit::audit_trail(invoice.id, &mut conn).await?;
        Ok(entries)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
