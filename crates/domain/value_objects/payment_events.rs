use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    PaymentConfirmed,
    CheckoutExpired,
    Ignored,
}

/// Gateway event reduced to what reconciliation needs. Metadata fields stay
/// optional: events not created by this service carry none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_id: String,
    pub event_type: String,
    pub kind: PaymentEventKind,
    pub slot_id: Option<Uuid>,
    pub hold_started_at: Option<DateTime<Utc>>,
    pub provider_email: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub payment_ref: Option<String>,
    pub amount_minor: Option<i64>,
}

impl PaymentEvent {
    pub fn ignored(event_id: &str, event_type: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            kind: PaymentEventKind::Ignored,
            slot_id: None,
            hold_started_at: None,
            provider_email: None,
            customer_email: None,
            customer_name: None,
            payment_ref: None,
            amount_minor: None,
        }
    }
}
