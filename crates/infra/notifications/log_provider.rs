use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::dispatcher::NotificationProvider;
use crate::domain::value_objects::bookings::BookingConfirmed;

/// Always-on sink so every confirmed booking leaves a structured trace.
pub struct LogNotificationProvider;

#[async_trait]
impl NotificationProvider for LogNotificationProvider {
    async fn send(&self, event: &BookingConfirmed) -> Result<()> {
        info!(
            slot_id = %event.slot_id,
            provider_email = %event.provider_email,
            slot_date = %event.slot_date,
            start_time = %event.start_time,
            deposit_paid = event.deposit_paid,
            "notifications: booking confirmed"
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}
