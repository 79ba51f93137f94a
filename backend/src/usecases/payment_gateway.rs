use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::value_objects::{bookings::DepositSessionRequest, payment_events::PaymentEvent},
    payments::stripe_client::{StripeClient, StripeWebhookError, to_payment_event},
};

/// What the booking flow and the webhook reconciler need from the payment
/// provider. Implementations never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepositGateway: Send + Sync {
    /// Opens a hosted checkout for one deposit hold and returns its URL.
    async fn create_deposit_session(&self, request: DepositSessionRequest) -> AnyResult<String>;

    /// Authenticates a raw callback and reduces it to a domain event.
    fn verify_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentEvent, StripeWebhookError>;
}

#[async_trait]
impl DepositGateway for StripeClient {
    async fn create_deposit_session(&self, request: DepositSessionRequest) -> AnyResult<String> {
        StripeClient::create_deposit_session(self, &request).await
    }

    fn verify_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentEvent, StripeWebhookError> {
        let event = self.verify_webhook_signature(payload, signature)?;
        Ok(to_payment_event(&event))
    }
}
