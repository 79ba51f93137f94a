use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::slot_statuses::SlotStatus,
    infra::db::postgres::schema::slots,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = slots)]
pub struct SlotEntity {
    pub id: Uuid,
    pub provider_email: String,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    pub status: String,
    pub active: bool,
    pub booked_at: Option<DateTime<Utc>>,
    pub deposit_required: bool,
    pub deposit_amount_minor: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl SlotEntity {
    /// Unknown stored values are treated as not open.
    pub fn slot_status(&self) -> Option<SlotStatus> {
        SlotStatus::from_str(&self.status)
    }

    pub fn is_bookable(&self) -> bool {
        self.active && self.slot_status() == Some(SlotStatus::Open)
    }
}
