use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::{
    repositories::notifications::BookingNotifier, value_objects::bookings::BookingConfirmed,
};

pub const NOTIFICATION_QUEUE_CAPACITY: usize = 256;

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send(&self, event: &BookingConfirmed) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Queues booking facts on a bounded channel drained by one background task.
/// Must be constructed inside a tokio runtime.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<BookingConfirmed>,
}

impl NotificationDispatcher {
    pub fn new(providers: Vec<Arc<dyn NotificationProvider>>) -> Self {
        Self::with_capacity(providers, NOTIFICATION_QUEUE_CAPACITY)
    }

    pub fn with_capacity(providers: Vec<Arc<dyn NotificationProvider>>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<BookingConfirmed>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for provider in &providers {
                    if let Err(error) = provider.send(&event).await {
                        warn!(
                            provider = provider.provider_name(),
                            slot_id = %event.slot_id,
                            error = %error,
                            "notifications: provider failed"
                        );
                    }
                }
            }
        });

        Self { tx }
    }
}

impl BookingNotifier for NotificationDispatcher {
    fn booking_confirmed(&self, event: BookingConfirmed) {
        let slot_id = event.slot_id;
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%slot_id, "notifications: queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(%slot_id, "notifications: queue closed; dropping event");
            }
        }
    }
}
