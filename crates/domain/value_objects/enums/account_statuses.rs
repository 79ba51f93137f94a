use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
        }
    }

    /// An unset status counts as active; any value other than `active` is
    /// treated as suspended.
    pub fn from_optional(value: Option<&str>) -> Self {
        match value {
            None => AccountStatus::Active,
            Some(v) if v.trim().eq_ignore_ascii_case("active") => AccountStatus::Active,
            Some(_) => AccountStatus::Suspended,
        }
    }
}

impl Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
