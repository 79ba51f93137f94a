use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::bookings;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub slot_id: Uuid,
    pub provider_email: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
