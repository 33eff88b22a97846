use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Invoice, InvoiceId, InvoiceStatus, NewInvoice},
    traits::InvoiceGatewayError,
};

/// Inserts the invoice header into the database, returning `false` in the second parameter if an invoice with
/// the same invoice number already exists. Line items are handled separately by [`super::line_items`].
pub async fn idempotent_insert(
    invoice: &NewInvoice,
    conn: &mut SqliteConnection,
) -> Result<(Invoice, bool), InvoiceGatewayError> {
    let inserted = match fetch_invoice_by_number(&invoice.invoice_number, conn).await? {
        Some(invoice) => (invoice, false),
        None => {
            let invoice = insert_invoice(invoice, conn).await?;
            debug!("📝️ Invoice [{}] inserted with id {}", invoice.invoice_number, invoice.id);
            (invoice, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new invoice into the database using the given connection. This is not atomic. You can embed this
/// call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_invoice(invoice: &NewInvoice, conn: &mut SqliteConnection) -> Result<Invoice, InvoiceGatewayError> {
    let invoice = sqlx::query_as(
        r#"
            INSERT INTO invoices (
                invoice_number,
                vendor,
                invoice_date,
                total,
                po_number
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(invoice.invoice_number.as_str())
    .bind(&invoice.vendor)
    .bind(invoice.invoice_date)
    .bind(invoice.total.value())
    .bind(&invoice.po_number)
    .fetch_one(conn)
    .await?;
    Ok(invoice)
}

/// Returns the invoice with the given invoice number, if it exists.
pub async fn fetch_invoice_by_number(
    number: &InvoiceId,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as("SELECT * FROM invoices WHERE invoice_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(invoice)
}

/// Sets the invoice's status and bumps `updated_at`, returning the updated record. Callers are responsible for
/// validating the transition and for wrapping this in a transaction with the paired audit entry.
pub async fn update_status(
    id: i64,
    status: InvoiceStatus,
    conn: &mut SqliteConnection,
) -> Result<Invoice, InvoiceGatewayError> {
    let invoice = sqlx::query_as(
        "UPDATE invoices SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(invoice)
}
