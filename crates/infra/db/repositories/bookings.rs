use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};
use domain::{
    entities::bookings::InsertBookingEntity, repositories::bookings::BookingRepository,
    value_objects::enums::booking_statuses::BookingStatus,
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn record_booking(&self, insert_booking_entity: InsertBookingEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(bookings::table)
            .values(&insert_booking_entity)
            .returning(bookings::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn mark_booking_paid(
        &self,
        slot_id: Uuid,
        payment_ref: Option<String>,
        paid_at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(bookings::table)
            .filter(bookings::slot_id.eq(slot_id))
            .filter(bookings::status.eq(BookingStatus::PendingDeposit.as_str()))
            .set((
                bookings::status.eq(BookingStatus::Booked.as_str()),
                bookings::payment_ref.eq(payment_ref),
                bookings::paid_at.eq(Some(paid_at)),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    async fn mark_bookings_expired(&self, slot_ids: Vec<Uuid>) -> Result<usize> {
        if slot_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(bookings::table)
            .filter(bookings::slot_id.eq_any(slot_ids))
            .filter(bookings::status.eq(BookingStatus::PendingDeposit.as_str()))
            .set(bookings::status.eq(BookingStatus::Expired.as_str()))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
