use sqlx::SqliteConnection;

use crate::{
    db_types::{LineItem, NewLineItem},
    traits::InvoiceGatewayError,
};

/// Inserts the invoice's line items in order. Positions are assigned from the slice index, so the stored order
/// is exactly the extraction order.
pub async fn insert_line_items(
    invoice_id: i64,
    items: &[NewLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), InvoiceGatewayError> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO line_items (invoice_id, position, description, quantity, price)
                VALUES ($1, $2, $3, $4, $5);
            "#,
        )
        .bind(invoice_id)
        .bind(position as i64)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price.value())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Returns the invoice's line items in position order.
pub async fn fetch_line_items(invoice_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM line_items WHERE invoice_id = $1 ORDER BY position")
        .bind(invoice_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
