use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::InsertBookingEntity;

#[async_trait]
#[automock]
pub trait BookingRepository {
    async fn record_booking(&self, insert_booking_entity: InsertBookingEntity) -> Result<Uuid>;

    /// Marks pending bookings of `slot_id` as booked with payment metadata.
    async fn mark_booking_paid(
        &self,
        slot_id: Uuid,
        payment_ref: Option<String>,
        paid_at: DateTime<Utc>,
    ) -> Result<usize>;

    async fn mark_bookings_expired(&self, slot_ids: Vec<Uuid>) -> Result<usize>;
}
