use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, notifications::BookingNotifier, slots::SlotRepository,
        },
        value_objects::{
            bookings::{
                BookingConfirmed, FinalizeDepositModel, FinalizeOutcome, ReleaseHoldModel,
                ReleaseOutcome,
            },
            payment_events::{PaymentEvent, PaymentEventKind},
        },
    },
    payments::stripe_client::StripeWebhookError,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::payment_gateway::DepositGateway;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook signature rejected: {0}")]
    InvalidSignature(StripeWebhookError),
    #[error("slot store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WebhookError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            // 5xx makes the gateway redeliver later.
            WebhookError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// How an authenticated event was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
    Finalized,
    Released,
    AlreadyProcessed,
    /// The event refers to no active hold; nothing was changed.
    Unmatched,
    Ignored,
}

pub struct PaymentWebhookUseCase {
    gateway: Arc<dyn DepositGateway>,
    slot_repo: Arc<dyn SlotRepository + Send + Sync>,
    booking_repo: Arc<dyn BookingRepository + Send + Sync>,
    notifier: Arc<dyn BookingNotifier + Send + Sync>,
}

impl PaymentWebhookUseCase {
    pub fn new(
        gateway: Arc<dyn DepositGateway>,
        slot_repo: Arc<dyn SlotRepository + Send + Sync>,
        booking_repo: Arc<dyn BookingRepository + Send + Sync>,
        notifier: Arc<dyn BookingNotifier + Send + Sync>,
    ) -> Self {
        Self {
            gateway,
            slot_repo,
            booking_repo,
            notifier,
        }
    }

    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<WebhookAck, WebhookError> {
        let event = match self.gateway.verify_event(payload, signature) {
            Ok(event) => event,
            // Authentic but unreadable: a non-2xx would only be redelivered.
            Err(StripeWebhookError::InvalidPayload(reason)) => {
                warn!(%reason, "payment_webhook: signed payload could not be parsed, acknowledging");
                return Ok(WebhookAck::Ignored);
            }
            Err(other) => {
                warn!(error = %other, "payment_webhook: signature verification failed, possible tampering");
                return Err(WebhookError::InvalidSignature(other));
            }
        };

        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            "payment_webhook: event verified"
        );

        if event.kind == PaymentEventKind::Ignored {
            debug!(event_type = %event.event_type, "payment_webhook: event type not handled");
            return Ok(WebhookAck::Ignored);
        }

        let Some(slot_id) = event.slot_id else {
            info!(
                event_id = %event.event_id,
                "payment_webhook: event carries no deposit slot, acknowledging"
            );
            return Ok(WebhookAck::Ignored);
        };

        match event.kind {
            PaymentEventKind::PaymentConfirmed => self.finalize(slot_id, event).await,
            PaymentEventKind::CheckoutExpired => self.release(slot_id, event).await,
            PaymentEventKind::Ignored => Ok(WebhookAck::Ignored),
        }
    }

    async fn finalize(&self, slot_id: Uuid, event: PaymentEvent) -> Result<WebhookAck, WebhookError> {
        let Some(hold_started_at) = event.hold_started_at else {
            warn!(
                %slot_id,
                event_id = %event.event_id,
                payment_ref = ?event.payment_ref,
                "payment_webhook: payment without hold timestamp, reconcile manually"
            );
            return Ok(WebhookAck::Unmatched);
        };

        let model = FinalizeDepositModel {
            slot_id,
            event_id: event.event_id.clone(),
            event_type: event.event_type.clone(),
            hold_started_at,
        };

        let outcome = self.slot_repo.finalize_deposit(model).await.map_err(|err| {
            error!(
                %slot_id,
                event_id = %event.event_id,
                db_error = ?err,
                "payment_webhook: finalize failed"
            );
            WebhookError::StoreUnavailable(err)
        })?;

        match outcome {
            FinalizeOutcome::Finalized(slot) => {
                info!(
                    %slot_id,
                    event_id = %event.event_id,
                    amount_minor = ?event.amount_minor,
                    "payment_webhook: deposit finalized"
                );
                if event
                    .provider_email
                    .as_deref()
                    .is_some_and(|email| !email.eq_ignore_ascii_case(&slot.provider_email))
                {
                    warn!(%slot_id, "payment_webhook: event provider differs from slot owner");
                }

                if let Err(err) = self
                    .booking_repo
                    .mark_booking_paid(slot_id, event.payment_ref.clone(), Utc::now())
                    .await
                {
                    warn!(%slot_id, db_error = ?err, "payment_webhook: booking payment metadata not stored");
                }

                self.notifier.booking_confirmed(BookingConfirmed {
                    customer_email: event.customer_email,
                    customer_name: event.customer_name,
                    deposit_paid: true,
                    payment_ref: event.payment_ref,
                    ..BookingConfirmed::for_slot(&slot)
                });
                Ok(WebhookAck::Finalized)
            }
            FinalizeOutcome::DuplicateEvent => {
                info!(%slot_id, event_id = %event.event_id, "payment_webhook: duplicate event");
                Ok(WebhookAck::AlreadyProcessed)
            }
            FinalizeOutcome::AlreadyBooked => {
                info!(%slot_id, "payment_webhook: slot already booked");
                Ok(WebhookAck::AlreadyProcessed)
            }
            FinalizeOutcome::HoldNotActive(status) => {
                warn!(
                    %slot_id,
                    event_id = %event.event_id,
                    status = ?status,
                    payment_ref = ?event.payment_ref,
                    "payment_webhook: payment for a hold that is no longer active, reconcile manually"
                );
                Ok(WebhookAck::Unmatched)
            }
            FinalizeOutcome::SlotNotFound => {
                warn!(%slot_id, event_id = %event.event_id, "payment_webhook: slot not found");
                Ok(WebhookAck::Unmatched)
            }
        }
    }

    async fn release(&self, slot_id: Uuid, event: PaymentEvent) -> Result<WebhookAck, WebhookError> {
        let Some(hold_started_at) = event.hold_started_at else {
            warn!(
                %slot_id,
                event_id = %event.event_id,
                "payment_webhook: expiry without hold timestamp, leaving slot to the sweeper"
            );
            return Ok(WebhookAck::Unmatched);
        };

        let model = ReleaseHoldModel {
            slot_id,
            event_id: event.event_id.clone(),
            event_type: event.event_type.clone(),
            hold_started_at,
        };

        let outcome = self.slot_repo.release_hold(model).await.map_err(|err| {
            error!(
                %slot_id,
                event_id = %event.event_id,
                db_error = ?err,
                "payment_webhook: hold release failed"
            );
            WebhookError::StoreUnavailable(err)
        })?;

        match outcome {
            ReleaseOutcome::Released => {
                info!(%slot_id, "payment_webhook: checkout expired, hold released");
                if let Err(err) = self.booking_repo.mark_bookings_expired(vec![slot_id]).await {
                    warn!(%slot_id, db_error = ?err, "payment_webhook: booking not marked expired");
                }
                Ok(WebhookAck::Released)
            }
            ReleaseOutcome::DuplicateEvent => Ok(WebhookAck::AlreadyProcessed),
            ReleaseOutcome::NotHeld => {
                debug!(%slot_id, "payment_webhook: expiry for a hold no longer pending");
                Ok(WebhookAck::Unmatched)
            }
        }
    }
}
