use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    booking::BookingError, payment_webhook::WebhookError, slot_catalog::CatalogError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Booking(err) => err.status_code(),
            AppError::Catalog(err) => err.status_code(),
            AppError::Webhook(err) => err.status_code(),
        }
    }

    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Booking(err) => match err {
                BookingError::InvalidRequest(code) => *code,
                BookingError::NotFound => "slot_not_found",
                BookingError::Conflict => "slot_unavailable",
                BookingError::Configuration(_) => "server_error",
                BookingError::Upstream(_) => "payment_unavailable",
                BookingError::StoreUnavailable(_) => "store_unavailable",
            },
            AppError::Catalog(CatalogError::StoreUnavailable(_)) => "store_unavailable",
            AppError::Webhook(err) => match err {
                WebhookError::InvalidSignature(_) => "invalid_signature",
                WebhookError::StoreUnavailable(_) => "store_unavailable",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Details were logged by the use case; never leak them to the client.
        let body = Json(ErrorResponse { error: self.code() });
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::booking::MISSING_FIELDS;

    #[test]
    fn maps_business_outcomes_to_codes() {
        let cases = [
            (
                AppError::from(BookingError::InvalidRequest(MISSING_FIELDS)),
                400,
                "missing_fields",
            ),
            (AppError::from(BookingError::NotFound), 404, "slot_not_found"),
            (AppError::from(BookingError::Conflict), 409, "slot_unavailable"),
            (
                AppError::from(BookingError::Configuration("no profile".to_string())),
                500,
                "server_error",
            ),
            (
                AppError::from(BookingError::Upstream(anyhow::anyhow!("stripe down"))),
                502,
                "payment_unavailable",
            ),
            (
                AppError::from(CatalogError::StoreUnavailable(anyhow::anyhow!("pool"))),
                503,
                "store_unavailable",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn internal_detail_stays_out_of_the_body() {
        let err = AppError::from(BookingError::StoreUnavailable(anyhow::anyhow!(
            "password authentication failed for user postgres"
        )));
        let body = serde_json::to_string(&ErrorResponse { error: err.code() }).unwrap();
        assert_eq!(body, r#"{"error":"store_unavailable"}"#);
    }
}
