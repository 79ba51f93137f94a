use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_events;

/// Ledger row for a gateway event that has already been applied.
#[derive(Debug, Clone, Insertable, Queryable, Selectable)]
#[diesel(table_name = payment_events)]
pub struct ProcessedPaymentEventEntity {
    pub event_id: String,
    pub slot_id: Uuid,
    pub event_type: String,
    pub received_at: DateTime<Utc>,
}
