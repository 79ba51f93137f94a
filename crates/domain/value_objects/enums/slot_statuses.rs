use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Availability state of a slot. The only legal moves are
/// `Open -> PendingDeposit -> Booked` and `Open -> Booked`; a hold is
/// released back to `Open` only by the deposit hold policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Open,
    PendingDeposit,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Open => "open",
            SlotStatus::PendingDeposit => "pending_deposit",
            SlotStatus::Booked => "booked",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(SlotStatus::Open),
            "pending_deposit" => Some(SlotStatus::PendingDeposit),
            "booked" => Some(SlotStatus::Booked),
            _ => None,
        }
    }
}

impl Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_values_case_insensitively() {
        assert_eq!(SlotStatus::from_str("open"), Some(SlotStatus::Open));
        assert_eq!(
            SlotStatus::from_str(" Pending_Deposit "),
            Some(SlotStatus::PendingDeposit)
        );
        assert_eq!(SlotStatus::from_str("BOOKED"), Some(SlotStatus::Booked));
        assert_eq!(SlotStatus::from_str("cancelled"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        let raw = serde_json::to_string(&SlotStatus::PendingDeposit).unwrap();
        assert_eq!(raw, "\"pending_deposit\"");
    }
}
