use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::{bookings::InsertBookingEntity, profiles::ProfileEntity, slots::SlotEntity},
    repositories::{
        bookings::BookingRepository, notifications::BookingNotifier, profiles::ProfileRepository,
        slots::SlotRepository,
    },
    value_objects::{
        bookings::{
            BookSlotModel, BookingConfirmed, CreateDepositModel, CustomerContact,
            DepositInstructions, DepositSessionRequest, ReservationOutcome, hold_timestamp,
            payment_reference,
        },
        deposits::{self, DepositDecision},
        enums::{booking_statuses::BookingStatus, slot_statuses::SlotStatus},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::payment_gateway::DepositGateway;

pub const MISSING_FIELDS: &str = "missing_fields";

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("slot not found")]
    NotFound,
    #[error("slot is no longer available")]
    Conflict,
    #[error("configuration defect: {0}")]
    Configuration(String),
    #[error("payment provider unavailable")]
    Upstream(#[source] anyhow::Error),
    #[error("slot store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::Conflict => StatusCode::CONFLICT,
            BookingError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BookingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

pub struct BookingUseCase {
    slot_repo: Arc<dyn SlotRepository + Send + Sync>,
    profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
    booking_repo: Arc<dyn BookingRepository + Send + Sync>,
    gateway: Arc<dyn DepositGateway>,
    notifier: Arc<dyn BookingNotifier + Send + Sync>,
}

impl BookingUseCase {
    pub fn new(
        slot_repo: Arc<dyn SlotRepository + Send + Sync>,
        profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
        booking_repo: Arc<dyn BookingRepository + Send + Sync>,
        gateway: Arc<dyn DepositGateway>,
        notifier: Arc<dyn BookingNotifier + Send + Sync>,
    ) -> Self {
        Self {
            slot_repo,
            profile_repo,
            booking_repo,
            gateway,
            notifier,
        }
    }

    /// Direct reservation: name, email and phone are mandatory.
    pub async fn reserve(&self, model: BookSlotModel) -> UseCaseResult<ReservationOutcome> {
        let (Some(slot_id), Some(name), Some(email), Some(phone)) = (
            non_empty(model.slot_id),
            non_empty(model.name),
            non_empty(model.email),
            non_empty(model.phone),
        ) else {
            let err = BookingError::InvalidRequest(MISSING_FIELDS);
            warn!(
                status = err.status_code().as_u16(),
                "booking: reservation rejected, missing fields"
            );
            return Err(err);
        };

        let contact = CustomerContact {
            name: Some(name),
            email,
            phone: Some(phone),
            notes: non_empty(model.notes),
        };

        self.place_reservation(&slot_id, contact).await
    }

    /// Deposit-first entry point; only the slot and customer email are
    /// mandatory.
    pub async fn create_deposit(
        &self,
        model: CreateDepositModel,
    ) -> UseCaseResult<ReservationOutcome> {
        let (Some(slot_id), Some(email)) =
            (non_empty(model.slot_id), non_empty(model.customer_email))
        else {
            let err = BookingError::InvalidRequest(MISSING_FIELDS);
            warn!(
                status = err.status_code().as_u16(),
                "booking: create deposit rejected, missing fields"
            );
            return Err(err);
        };

        let contact = CustomerContact {
            name: non_empty(model.customer_name),
            email,
            phone: None,
            notes: None,
        };

        self.place_reservation(&slot_id, contact).await
    }

    async fn place_reservation(
        &self,
        raw_slot_id: &str,
        contact: CustomerContact,
    ) -> UseCaseResult<ReservationOutcome> {
        let Ok(slot_id) = Uuid::parse_str(raw_slot_id) else {
            info!("booking: unparseable slot id");
            return Err(BookingError::NotFound);
        };

        let slot = self.load_open_slot(slot_id).await?;

        let provider = self
            .profile_repo
            .find_by_email(&slot.provider_email)
            .await
            .map_err(|err| {
                error!(%slot_id, db_error = ?err, "booking: failed to load provider profile");
                BookingError::StoreUnavailable(err)
            })?
            .ok_or_else(|| {
                error!(
                    %slot_id,
                    provider_email = %slot.provider_email,
                    "booking: slot owner has no provider profile"
                );
                BookingError::Configuration("slot owner has no provider profile".to_string())
            })?;

        let decision = deposits::decide(&slot, &provider);
        let target = if decision.use_deposit {
            SlotStatus::PendingDeposit
        } else {
            SlotStatus::Booked
        };
        if decision.required && !decision.use_deposit {
            info!(
                %slot_id,
                amount_minor = decision.amount_minor,
                has_payee = decision.payee.is_some(),
                "booking: deposit required but not collectable, booking directly"
            );
        }

        let held_at = hold_timestamp(Utc::now());
        let claimed = self
            .slot_repo
            .claim_open_slot(slot_id, target, held_at)
            .await
            .map_err(|err| {
                error!(%slot_id, db_error = ?err, "booking: failed to claim slot");
                BookingError::StoreUnavailable(err)
            })?;
        if !claimed {
            info!(%slot_id, "booking: lost the race for slot");
            return Err(BookingError::Conflict);
        }
        info!(%slot_id, status = %target, "booking: slot claimed");

        self.record_booking(&slot, &contact, target).await;

        match decision {
            DepositDecision {
                use_deposit: true,
                payee: Some(payee),
                amount_minor,
                ..
            } => {
                let reference = payment_reference(&slot_id.to_string(), &contact.email);
                let request = DepositSessionRequest {
                    slot_id,
                    provider_email: slot.provider_email.clone(),
                    provider_name: provider_name(&provider),
                    customer_email: contact.email.clone(),
                    customer_name: contact.name.clone(),
                    amount_minor,
                    slot_label: slot_label(&slot),
                    hold_started_at: held_at,
                    payment_reference: reference.clone(),
                };

                let checkout_url = self
                    .gateway
                    .create_deposit_session(request)
                    .await
                    .map_err(|err| {
                        error!(
                            %slot_id,
                            gateway_error = ?err,
                            "booking: checkout session failed; hold stays pending until released"
                        );
                        BookingError::Upstream(err)
                    })?;

                info!(%slot_id, amount_minor, "booking: deposit checkout created");
                Ok(ReservationOutcome::PaymentRequired(DepositInstructions {
                    checkout_url,
                    iban: payee.iban,
                    bic: payee.bic,
                    amount_minor,
                    reference,
                }))
            }
            _ => {
                self.notifier.booking_confirmed(BookingConfirmed {
                    customer_email: Some(contact.email),
                    customer_name: contact.name,
                    ..BookingConfirmed::for_slot(&slot)
                });
                Ok(ReservationOutcome::Confirmed)
            }
        }
    }

    async fn load_open_slot(&self, slot_id: Uuid) -> UseCaseResult<SlotEntity> {
        let slot = self
            .slot_repo
            .find_by_id(slot_id)
            .await
            .map_err(|err| {
                error!(%slot_id, db_error = ?err, "booking: failed to load slot");
                BookingError::StoreUnavailable(err)
            })?
            .filter(|slot| slot.active)
            .ok_or(BookingError::NotFound)?;

        if slot.slot_status() != Some(SlotStatus::Open) {
            info!(%slot_id, status = %slot.status, "booking: slot not open");
            return Err(BookingError::Conflict);
        }

        Ok(slot)
    }

    // Audit only; the slot row already carries the outcome.
    async fn record_booking(&self, slot: &SlotEntity, contact: &CustomerContact, status: SlotStatus) {
        let insert_booking_entity = InsertBookingEntity {
            slot_id: slot.id,
            provider_email: slot.provider_email.clone(),
            customer_name: contact.name.clone().unwrap_or_default(),
            customer_email: contact.email.clone(),
            customer_phone: contact.phone.clone(),
            notes: contact.notes.clone(),
            status: BookingStatus::from_slot_status(status).to_string(),
            created_at: Utc::now(),
        };

        if let Err(err) = self.booking_repo.record_booking(insert_booking_entity).await {
            warn!(slot_id = %slot.id, db_error = ?err, "booking: audit record insert failed");
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn provider_name(provider: &ProfileEntity) -> String {
    provider
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&provider.email)
        .to_string()
}

fn slot_label(slot: &SlotEntity) -> String {
    format!(
        "{} {}-{}",
        slot.slot_date.format("%Y-%m-%d"),
        slot.start_time.format("%H:%M"),
        slot.end_time.format("%H:%M")
    )
}
