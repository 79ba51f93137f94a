use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use crates::domain::value_objects::bookings::{
    BookSlotModel, CreateDepositModel, DepositInstructions, ReservationOutcome,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use super::search::major_units;
use crate::{
    axum_http::error_responses::AppError,
    usecases::booking::{BookingError, BookingUseCase, MISSING_FIELDS},
};

pub fn routes(booking_usecase: Arc<BookingUseCase>) -> Router {
    Router::new()
        .route("/book-slot", post(book_slot))
        .route("/create-deposit", post(create_deposit))
        .with_state(booking_usecase)
}

#[derive(Debug, Serialize)]
pub struct BookSlotResponse {
    pub ok: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<DepositResponse>,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub iban: String,
    pub bic: Option<String>,
    pub amount: f64,
    /// Transfer reference the customer quotes when paying by bank.
    pub message: String,
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateDepositResponse {
    pub ok: bool,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<DepositInstructions> for DepositResponse {
    fn from(instructions: DepositInstructions) -> Self {
        Self {
            iban: instructions.iban,
            bic: instructions.bic,
            amount: major_units(instructions.amount_minor),
            message: instructions.reference,
            checkout_url: instructions.checkout_url,
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|err| {
        info!(error = %err, "bookings router: unreadable request body");
        AppError::from(BookingError::InvalidRequest(MISSING_FIELDS))
    })
}

pub async fn book_slot(
    State(booking_usecase): State<Arc<BookingUseCase>>,
    body: Bytes,
) -> Result<Json<BookSlotResponse>, AppError> {
    let model: BookSlotModel = parse_body(&body)?;

    let response = match booking_usecase.reserve(model).await? {
        ReservationOutcome::Confirmed => BookSlotResponse {
            ok: true,
            status: "booked",
            deposit: None,
        },
        ReservationOutcome::PaymentRequired(instructions) => BookSlotResponse {
            ok: true,
            status: "pending_deposit",
            deposit: Some(instructions.into()),
        },
    };

    Ok(Json(response))
}

pub async fn create_deposit(
    State(booking_usecase): State<Arc<BookingUseCase>>,
    body: Bytes,
) -> Result<Json<CreateDepositResponse>, AppError> {
    let model: CreateDepositModel = parse_body(&body)?;

    let response = match booking_usecase.create_deposit(model).await? {
        ReservationOutcome::Confirmed => CreateDepositResponse {
            ok: true,
            mode: "no_deposit",
            url: None,
        },
        ReservationOutcome::PaymentRequired(instructions) => CreateDepositResponse {
            ok: true,
            mode: "deposit",
            url: Some(instructions.checkout_url),
        },
    };

    Ok(Json(response))
}
