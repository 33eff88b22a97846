use log::*;

use crate::{ExternalInvoiceId, InvoicePayload, OrderDeskApiError, OrderDeskClient, ReferenceLine, ReferenceOrder};

/// A deterministic, offline implementation of [`OrderDeskClient`].
///
/// Constructed explicitly where network I/O is unwanted (tests, dev environments). Always returns the configured
/// canned data; never performs I/O and never fails.
#[derive(Debug, Clone)]
pub struct CannedOrderDesk {
    reference_lines: Vec<ReferenceLine>,
    external_id: String,
}

impl Default for CannedOrderDesk {
    fn default() -> Self {
        Self { reference_lines: vec![ReferenceLine { quantity: 10.0, price: 99.5 }], external_id: "OD-INV-42".into() }
    }
}

impl CannedOrderDesk {
    pub fn new(reference_lines: Vec<ReferenceLine>, external_id: &str) -> Self {
        Self { reference_lines, external_id: external_id.to_string() }
    }

    pub fn with_reference_lines(mut self, lines: Vec<ReferenceLine>) -> Self {
        self.reference_lines = lines;
        self
    }
}

impl OrderDeskClient for CannedOrderDesk {
    async fn get_reference_order(&self, po_number: &str) -> Result<ReferenceOrder, OrderDeskApiError> {
        debug!("Canned client returning {} reference lines for PO {po_number}", self.reference_lines.len());
        Ok(ReferenceOrder { po_number: po_number.to_string(), lines: self.reference_lines.clone() })
    }

    async fn post_invoice(&self, invoice: &InvoicePayload) -> Result<ExternalInvoiceId, OrderDeskApiError> {
        debug!("Canned client accepting invoice {} without network I/O", invoice.invoice_number);
        Ok(ExternalInvoiceId(self.external_id.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn canned_responses_are_deterministic() {
        let client = CannedOrderDesk::default();
        let a = client.get_reference_order("PO-1001").await.unwrap();
        let b = client.get_reference_order("PO-1001").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.po_number, "PO-1001");
        assert_eq!(a.lines, vec![ReferenceLine { quantity: 10.0, price: 99.5 }]);

        let invoice = InvoicePayload {
            vendor: "Acme".into(),
            invoice_number: "INV-1".into(),
            invoice_date: "2026-08-01".into(),
            total: "995.00".into(),
            po_number: "PO-1001".into(),
            lines: vec![],
        };
        let id = client.post_invoice(&invoice).await.unwrap();
        assert_eq!(id, ExternalInvoiceId("OD-INV-42".into()));
    }
}
