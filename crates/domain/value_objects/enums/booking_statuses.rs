use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::slot_statuses::SlotStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingDeposit,
    Booked,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingDeposit => "pending_deposit",
            BookingStatus::Booked => "booked",
            BookingStatus::Expired => "expired",
        }
    }

    /// Booking rows mirror the slot status the reservation produced.
    pub fn from_slot_status(status: SlotStatus) -> Self {
        match status {
            SlotStatus::PendingDeposit => BookingStatus::PendingDeposit,
            SlotStatus::Open | SlotStatus::Booked => BookingStatus::Booked,
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
