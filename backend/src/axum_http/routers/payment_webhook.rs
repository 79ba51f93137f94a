use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use crates::payments::stripe_client::StripeWebhookError;
use serde::Serialize;
use tracing::debug;

use crate::{
    axum_http::error_responses::AppError,
    usecases::payment_webhook::{PaymentWebhookUseCase, WebhookError},
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(webhook_usecase: Arc<PaymentWebhookUseCase>) -> Router {
    Router::new()
        .route("/webhook", post(payment_webhook))
        .with_state(webhook_usecase)
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// Raw body on purpose: the signature covers the exact bytes Stripe sent.
pub async fn payment_webhook(
    State(webhook_usecase): State<Arc<PaymentWebhookUseCase>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::InvalidSignature(
            StripeWebhookError::MissingSignature,
        ))?;

    let ack = webhook_usecase.handle(&body, signature).await?;
    debug!(?ack, "payment webhook router: acknowledged");

    Ok(Json(WebhookResponse { received: true }))
}
