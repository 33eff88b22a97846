use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{AuditEntry, NewAuditEntry},
    traits::InvoiceGatewayError,
};

/// Appends an entry to the audit log. The log is append-only; there are no update or delete paths.
pub async fn insert_entry(entry: NewAuditEntry, conn: &mut SqliteConnection) -> Result<(), InvoiceGatewayError> {
    sqlx::query("INSERT INTO audit_log (invoice_id, event_kind, details) VALUES ($1, $2, $3)")
        .bind(entry.invoice_id)
        .bind(&entry.event_kind)
        .bind(Json(entry.details))
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns the invoice's audit entries in insertion order.
pub async fn audit_trail(invoice_id: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM audit_log WHERE invoice_id = $1 ORDER BY id")
        .bind(invoice_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
