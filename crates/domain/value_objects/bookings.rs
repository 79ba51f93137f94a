use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::slots::SlotEntity, value_objects::enums::slot_statuses::SlotStatus,
};

/// Body of a direct reservation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookSlotModel {
    pub slot_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Body of the deposit-first entry point.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDepositModel {
    #[serde(rename = "slotId", alias = "slot_id")]
    pub slot_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContact {
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositInstructions {
    pub checkout_url: String,
    pub iban: String,
    pub bic: Option<String>,
    pub amount_minor: i32,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    Confirmed,
    PaymentRequired(DepositInstructions),
}

/// Everything the gateway needs to open a hosted checkout for one hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositSessionRequest {
    pub slot_id: Uuid,
    pub provider_email: String,
    pub provider_name: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub amount_minor: i32,
    pub slot_label: String,
    pub hold_started_at: DateTime<Utc>,
    pub payment_reference: String,
}

impl DepositSessionRequest {
    /// Stable per hold, so a retried create maps onto the same session.
    pub fn idempotency_key(&self) -> String {
        format!(
            "deposit-{}-{}",
            self.slot_id,
            self.hold_started_at.timestamp_micros()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeDepositModel {
    pub slot_id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub hold_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    Finalized(SlotEntity),
    DuplicateEvent,
    AlreadyBooked,
    HoldNotActive(Option<SlotStatus>),
    SlotNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHoldModel {
    pub slot_id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub hold_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    DuplicateEvent,
    NotHeld,
}

/// Fact handed to the notification collaborator once a slot is booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmed {
    pub slot_id: Uuid,
    pub provider_email: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub deposit_paid: bool,
    pub payment_ref: Option<String>,
}

impl BookingConfirmed {
    pub fn for_slot(slot: &SlotEntity) -> Self {
        Self {
            slot_id: slot.id,
            provider_email: slot.provider_email.clone(),
            customer_email: None,
            customer_name: None,
            slot_date: slot.slot_date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            deposit_paid: false,
            payment_ref: None,
        }
    }
}

/// Bank transfer reference: `VP-<first 8 of slot id>-<first 10 alphanumerics
/// of the customer email>`, upper-cased.
pub fn payment_reference(slot_id: &str, customer_email: &str) -> String {
    let slot_part: String = slot_id.chars().take(8).collect();
    let email_part: String = customer_email
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect();

    format!("VP-{slot_part}-{email_part}").to_uppercase()
}

/// Hold timestamps are compared for equality against the stored
/// `booked_at`, so they carry the store's microsecond precision.
pub fn hold_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(6)
}
