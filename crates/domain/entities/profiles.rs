use diesel::prelude::*;

use crate::{
    domain::value_objects::enums::account_statuses::AccountStatus,
    infra::db::postgres::schema::profiles,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profiles, primary_key(email))]
pub struct ProfileEntity {
    pub email: String,
    pub display_name: Option<String>,
    pub category: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub account_status: Option<String>,
    pub deposit_enabled: bool,
    pub deposit_amount_minor: i32,
    pub iban: Option<String>,
    pub bic: Option<String>,
}

impl ProfileEntity {
    pub fn account_status(&self) -> AccountStatus {
        AccountStatus::from_optional(self.account_status.as_deref())
    }
}
