use chrono::NaiveDate;
use ivr_common::{Money, MoneyConversionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{InvoiceId, NewInvoice, NewLineItem};

/// The raw output of a field extractor for one document.
///
/// Every header field is optional because extraction is best-effort; nothing here has been validated yet.
/// Call [`ExtractedFields::validate`] to promote the record into a [`NewInvoice`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub vendor: Option<String>,
    pub invoice_number: Option<String>,
    /// ISO-8601 date, as extracted.
    pub invoice_date: Option<String>,
    /// Decimal currency string, e.g. "995.00".
    pub total: Option<String>,
    pub po_number: Option<String>,
    /// In document order. Position is significant downstream.
    pub line_items: Vec<ExtractedLineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLineItem {
    pub description: Option<String>,
    pub quantity: f64,
    /// Decimal currency string for the unit price.
    pub price: String,
}

impl ExtractedFields {
    /// Checks that every required header field is present and parseable. Missing fields are collected and
    /// reported together rather than one at a time.
    pub fn validate(self) -> Result<NewInvoice, ValidationError> {
        let mut missing = Vec::new();
        if self.vendor.is_none() {
            missing.push("vendor");
        }
        if self.invoice_number.is_none() {
            missing.push("invoice_number");
        }
        if self.invoice_date.is_none() {
            missing.push("invoice_date");
        }
        if self.total.is_none() {
            missing.push("total");
        }
        if self.po_number.is_none() {
            missing.push("po_number");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing.join(", ")));
        }
        // The is_none checks above guarantee these unwraps cannot fire.
        let (vendor, invoice_number, invoice_date, total, po_number) = match (
            self.vendor,
            self.invoice_number,
            self.invoice_date,
            self.total,
            self.po_number,
        ) {
            (Some(v), Some(n), Some(d), Some(t), Some(p)) => (v, n, d, t, p),
            _ => return Err(ValidationError::MissingFields(String::new())),
        };
        let invoice_date = NaiveDate::parse_from_str(&invoice_date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(invoice_date))?;
        let total = total.parse::<Money>()?;
        let line_items = self
            .line_items
            .into_iter()
            .map(|line| {
                let price = line.price.parse::<Money>()?;
                let mut item = NewLineItem::new(line.quantity, price);
                if let Some(description) = line.description {
                    item = item.with_description(&description);
                }
                Ok(item)
            })
            .collect::<Result<Vec<NewLineItem>, MoneyConversionError>>()?;
        let invoice = NewInvoice::new(InvoiceId(invoice_number), vendor, invoice_date, total, po_number)
            .with_line_items(line_items);
        Ok(invoice)
    }
}

/// The seam to whatever turns vendor documents into structured fields.
///
/// Implementations may call OCR services, parse structured attachments, or return canned data; the engine
/// only sees [`ExtractedFields`].
#[allow(async_fn_in_trait)]
pub trait FieldExtractor {
    async fn extract(&self, document: &[u8]) -> Result<ExtractedFields, ExtractionError>;
}

#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("The document could not be read: {0}")]
    UnreadableDocument(String),
    #[error("The extraction service failed: {0}")]
    ServiceError(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required fields are missing: {0}")]
    MissingFields(String),
    #[error("'{0}' is not a valid ISO-8601 date")]
    InvalidDate(String),
    #[error("Could not parse a currency amount. {0}")]
    InvalidAmount(#[from] MoneyConversionError),
}
