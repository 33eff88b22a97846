use serde::{Deserialize, Serialize};

/// The body of an approval callback, after signature verification.
///
/// `value` is the opaque string the notification carried in its action button; it holds the invoice number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub action_id: String,
    pub value: String,
}
