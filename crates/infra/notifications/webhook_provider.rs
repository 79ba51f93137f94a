use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::dispatcher::NotificationProvider;
use crate::domain::value_objects::bookings::BookingConfirmed;

/// Posts confirmed bookings as JSON to an external endpoint (mailer,
/// automation hook).
pub struct WebhookNotificationProvider {
    webhook_url: Url,
    client: Client,
}

impl WebhookNotificationProvider {
    pub fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

pub fn booking_confirmed_payload(event: &BookingConfirmed) -> serde_json::Value {
    json!({
        "type": "booking.confirmed",
        "booking": event,
    })
}

#[async_trait]
impl NotificationProvider for WebhookNotificationProvider {
    async fn send(&self, event: &BookingConfirmed) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&booking_confirmed_payload(event))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "booking webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn provider_name(&self) -> &'static str {
        "webhook"
    }
}

// The URL may embed a token; keep it out of error text.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("booking webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("booking webhook connection failed");
    }
    anyhow!("booking webhook request failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    #[test]
    fn payload_wraps_booking_fields() {
        let slot_id = Uuid::new_v4();
        let event = BookingConfirmed {
            slot_id,
            provider_email: "studio@example.com".to_string(),
            customer_email: None,
            customer_name: None,
            slot_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            deposit_paid: false,
            payment_ref: None,
        };

        let payload = booking_confirmed_payload(&event);

        assert_eq!(payload["type"], "booking.confirmed");
        assert_eq!(payload["booking"]["slot_id"], slot_id.to_string());
        assert_eq!(payload["booking"]["slot_date"], "2025-12-01");
        assert_eq!(payload["booking"]["start_time"], "14:00:00");
    }
}
