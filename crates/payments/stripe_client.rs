use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::domain::value_objects::{
    bookings::DepositSessionRequest,
    deposit_holds::checkout_expires_at,
    payment_events::{PaymentEvent, PaymentEventKind},
};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_seconds: i64,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub payment_method_types: Vec<String>,
    pub hold_ttl_minutes: Option<i64>,
}

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    settings: StripeSettings,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StripeWebhookError {
    #[error("stripe-signature header is missing a timestamp")]
    MissingTimestamp,
    #[error("stripe-signature header has no v1 signature")]
    MissingSignature,
    #[error("webhook timestamp is outside the tolerance window")]
    TimestampOutsideTolerance,
    #[error("webhook signature does not match")]
    SignatureMismatch,
    #[error("webhook payload is not a valid event: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

impl StripeClient {
    pub fn new(settings: StripeSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = resp.text().await.unwrap_or_default();
        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.clone()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.clone()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.clone()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.clone()),
            context = %context,
            "stripe: api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Form fields of a one-off deposit Checkout Session.
    pub fn deposit_session_form(
        &self,
        request: &DepositSessionRequest,
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.settings.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                format!("Deposit for your appointment at {}", request.provider_name),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                request.slot_label.clone(),
            ),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("client_reference_id".to_string(), request.slot_id.to_string()),
            ("success_url".to_string(), self.settings.success_url.clone()),
            ("cancel_url".to_string(), self.settings.cancel_url.clone()),
        ];

        for (idx, pm) in self.settings.payment_method_types.iter().enumerate() {
            body.push((format!("payment_method_types[{}]", idx), pm.clone()));
        }

        if let Some(expires_at) = session_expires_at(now, self.settings.hold_ttl_minutes) {
            body.push(("expires_at".to_string(), expires_at.to_string()));
        }

        for (key, value) in deposit_metadata(request) {
            body.push((format!("metadata[{}]", key), value));
        }

        body
    }

    /// Creates a deposit Checkout Session and returns its hosted URL.
    /// https://stripe.com/docs/api/checkout/sessions/create
    pub async fn create_deposit_session(&self, request: &DepositSessionRequest) -> Result<String> {
        let body = self.deposit_session_form(request, Utc::now());

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("Idempotency-Key", request.idempotency_key())
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create deposit checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, StripeWebhookError> {
        self.verify_webhook_signature_at(payload, signature_header, Utc::now().timestamp())
    }

    pub fn verify_webhook_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<StripeEvent, StripeWebhookError> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',').map(str::trim) {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest);
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signatures.push(rest);
            }
        }

        let timestamp = timestamp.ok_or(StripeWebhookError::MissingTimestamp)?;
        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| StripeWebhookError::MissingTimestamp)?;
        if signatures.is_empty() {
            return Err(StripeWebhookError::MissingSignature);
        }

        // `t=` is attacker controlled; abs_diff cannot overflow.
        let tolerance = self.settings.webhook_tolerance_seconds.max(0).unsigned_abs();
        if now_unix.abs_diff(signed_at) > tolerance {
            return Err(StripeWebhookError::TimestampOutsideTolerance);
        }

        let mut mac = HmacSha256::new_from_slice(self.settings.webhook_secret.as_bytes())
            .map_err(|_| StripeWebhookError::SignatureMismatch)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice compares in constant time.
        let matched = signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|provided| mac.clone().verify_slice(&provided).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(StripeWebhookError::SignatureMismatch);
        }

        serde_json::from_slice::<StripeEvent>(payload)
            .map_err(|err| StripeWebhookError::InvalidPayload(err.to_string()))
    }
}

/// Metadata bag that lets the webhook correlate a session back to its hold.
pub fn deposit_metadata(request: &DepositSessionRequest) -> HashMap<String, String> {
    HashMap::from([
        ("type".to_string(), "deposit".to_string()),
        ("slot_id".to_string(), request.slot_id.to_string()),
        ("provider_email".to_string(), request.provider_email.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
        (
            "customer_name".to_string(),
            request.customer_name.clone().unwrap_or_default(),
        ),
        (
            "hold_started_at".to_string(),
            request
                .hold_started_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
        (
            "payment_reference".to_string(),
            request.payment_reference.clone(),
        ),
    ])
}

pub fn session_expires_at(now: DateTime<Utc>, hold_ttl_minutes: Option<i64>) -> Option<i64> {
    checkout_expires_at(now, hold_ttl_minutes).map(|expires_at| expires_at.timestamp())
}

pub fn classify_event(event_type: &str, object: &Value) -> PaymentEventKind {
    match event_type {
        "checkout.session.completed" => {
            if object.get("payment_status").and_then(Value::as_str) == Some("unpaid") {
                PaymentEventKind::Ignored
            } else {
                PaymentEventKind::PaymentConfirmed
            }
        }
        "checkout.session.async_payment_succeeded" | "invoice.paid" | "invoice.payment_succeeded" => {
            PaymentEventKind::PaymentConfirmed
        }
        "checkout.session.expired" | "checkout.session.async_payment_failed" => {
            PaymentEventKind::CheckoutExpired
        }
        _ => PaymentEventKind::Ignored,
    }
}

/// Reduces a verified Stripe event to a domain payment event.
pub fn to_payment_event(event: &StripeEvent) -> PaymentEvent {
    let kind = classify_event(&event.type_, &event.data.object);
    if kind == PaymentEventKind::Ignored {
        return PaymentEvent::ignored(&event.id, &event.type_);
    }

    let object = &event.data.object;
    let metadata = object
        .get("metadata")
        .filter(|m| m.as_object().is_some_and(|m| !m.is_empty()))
        .or_else(|| object.pointer("/subscription_details/metadata"));
    let meta = |key: &str| -> Option<String> {
        metadata
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    // Only sessions opened by this service carry `type=deposit`.
    let is_deposit = meta("type").as_deref() == Some("deposit");
    let slot_id = meta("slot_id")
        .filter(|_| is_deposit)
        .and_then(|raw| Uuid::parse_str(&raw).ok());
    let hold_started_at = meta("hold_started_at")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|ts| ts.with_timezone(&Utc));

    let payment_ref = object
        .get("payment_intent")
        .and_then(Value::as_str)
        .or_else(|| object.get("id").and_then(Value::as_str))
        .map(str::to_string);
    let amount_minor = object
        .get("amount_total")
        .or_else(|| object.get("amount_paid"))
        .and_then(Value::as_i64);
    let customer_email = meta("customer_email").or_else(|| {
        object
            .pointer("/customer_details/email")
            .or_else(|| object.get("customer_email"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    PaymentEvent {
        event_id: event.id.clone(),
        event_type: event.type_.clone(),
        kind,
        slot_id,
        hold_started_at,
        provider_email: meta("provider_email"),
        customer_email,
        customer_name: meta("customer_name"),
        payment_ref,
        amount_minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    fn client() -> StripeClient {
        StripeClient::new(StripeSettings {
            secret_key: "sk_test".to_string(),
            webhook_secret: SECRET.to_string(),
            webhook_tolerance_seconds: DEFAULT_WEBHOOK_TOLERANCE_SECONDS,
            success_url: "http://localhost:8888/?booking=success".to_string(),
            cancel_url: "http://localhost:8888/?booking=cancel".to_string(),
            currency: "eur".to_string(),
            payment_method_types: vec!["card".to_string(), "bancontact".to_string()],
            hold_ttl_minutes: Some(45),
        })
    }

    fn sign(payload: &str, timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn completed_payload(slot_id: Uuid) -> String {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "payment_intent": "pi_1",
                "amount_total": 1500,
                "metadata": {
                    "type": "deposit",
                    "slot_id": slot_id.to_string(),
                    "hold_started_at": "2025-12-01T10:00:00.123456Z",
                    "customer_email": "jane@example.com"
                }
            }}
        })
        .to_string()
    }

    #[test]
    fn accepts_valid_signature_among_several_v1_values() {
        let payload = completed_payload(Uuid::new_v4());
        let now = 1_700_000_000;
        let header = format!(
            "t={now},v1={},v1={}",
            sign(&payload, now, "whsec_rotated_out"),
            sign(&payload, now, SECRET)
        );

        let event = client()
            .verify_webhook_signature_at(payload.as_bytes(), &header, now + 10)
            .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.type_, "checkout.session.completed");
    }

    #[test]
    fn rejects_tampered_body() {
        let payload = completed_payload(Uuid::new_v4());
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(&payload, now, SECRET));
        let tampered = payload.replace("1500", "1");

        let err = client()
            .verify_webhook_signature_at(tampered.as_bytes(), &header, now)
            .unwrap_err();

        assert_eq!(err, StripeWebhookError::SignatureMismatch);
    }

    #[test]
    fn rejects_signature_outside_tolerance() {
        let payload = completed_payload(Uuid::new_v4());
        let signed_at = 1_700_000_000;
        let header = format!("t={signed_at},v1={}", sign(&payload, signed_at, SECRET));

        let err = client()
            .verify_webhook_signature_at(payload.as_bytes(), &header, signed_at + 301)
            .unwrap_err();

        assert_eq!(err, StripeWebhookError::TimestampOutsideTolerance);
    }

    #[test]
    fn rejects_malformed_headers() {
        let c = client();
        assert_eq!(
            c.verify_webhook_signature_at(b"{}", "v1=abcd", 0).unwrap_err(),
            StripeWebhookError::MissingTimestamp
        );
        assert_eq!(
            c.verify_webhook_signature_at(b"{}", "t=0", 0).unwrap_err(),
            StripeWebhookError::MissingSignature
        );
        assert_eq!(
            c.verify_webhook_signature_at(b"{}", "t=0,v1=zz-not-hex", 0)
                .unwrap_err(),
            StripeWebhookError::SignatureMismatch
        );
    }

    #[test]
    fn extreme_timestamps_fall_outside_tolerance() {
        let c = client();
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert_eq!(
                c.verify_webhook_signature_at(b"{}", header, 1_700_000_000)
                    .unwrap_err(),
                StripeWebhookError::TimestampOutsideTolerance
            );
        }
        assert_eq!(
            c.verify_webhook_signature_at(b"{}", "t=0,v1=00", i64::MIN)
                .unwrap_err(),
            StripeWebhookError::TimestampOutsideTolerance
        );
    }

    #[test]
    fn translates_completed_session_with_metadata() {
        let slot_id = Uuid::new_v4();
        let payload = completed_payload(slot_id);
        let event: StripeEvent = serde_json::from_str(&payload).unwrap();

        let payment_event = to_payment_event(&event);

        assert_eq!(payment_event.kind, PaymentEventKind::PaymentConfirmed);
        assert_eq!(payment_event.slot_id, Some(slot_id));
        assert_eq!(payment_event.payment_ref.as_deref(), Some("pi_1"));
        assert_eq!(payment_event.amount_minor, Some(1500));
        assert_eq!(
            payment_event.hold_started_at.map(|ts| ts.timestamp_subsec_micros()),
            Some(123_456)
        );
    }

    #[test]
    fn classifies_event_types() {
        let paid = json!({ "payment_status": "paid" });
        let unpaid = json!({ "payment_status": "unpaid" });

        assert_eq!(
            classify_event("checkout.session.completed", &paid),
            PaymentEventKind::PaymentConfirmed
        );
        assert_eq!(
            classify_event("checkout.session.completed", &unpaid),
            PaymentEventKind::Ignored
        );
        assert_eq!(
            classify_event("invoice.payment_succeeded", &paid),
            PaymentEventKind::PaymentConfirmed
        );
        assert_eq!(
            classify_event("checkout.session.expired", &unpaid),
            PaymentEventKind::CheckoutExpired
        );
        assert_eq!(
            classify_event("customer.created", &paid),
            PaymentEventKind::Ignored
        );
    }

    #[test]
    fn foreign_metadata_type_yields_no_slot() {
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": { "object": {
                "id": "in_1",
                "metadata": { "type": "subscription", "slot_id": Uuid::new_v4().to_string() }
            }}
        }))
        .unwrap();

        let payment_event = to_payment_event(&event);

        assert_eq!(payment_event.kind, PaymentEventKind::PaymentConfirmed);
        assert_eq!(payment_event.slot_id, None);
        assert_eq!(payment_event.payment_ref.as_deref(), Some("in_1"));
    }

    #[test]
    fn untyped_metadata_yields_no_slot() {
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_3",
            "type": "invoice.paid",
            "data": { "object": {
                "id": "in_2",
                "metadata": { "slot_id": Uuid::new_v4().to_string() }
            }}
        }))
        .unwrap();

        assert_eq!(to_payment_event(&event).slot_id, None);
    }

    #[test]
    fn deposit_form_carries_amount_metadata_and_clamped_expiry() {
        let hold_started_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let request = DepositSessionRequest {
            slot_id: Uuid::nil(),
            provider_email: "studio@example.com".to_string(),
            provider_name: "Studio".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_name: Some("Jane".to_string()),
            amount_minor: 1500,
            slot_label: "2025-12-01 14:00-15:00".to_string(),
            hold_started_at,
            payment_reference: "VP-00000000-JANEEXAMPL".to_string(),
        };

        let form: HashMap<String, String> = client()
            .deposit_session_form(&request, hold_started_at)
            .into_iter()
            .collect();

        assert_eq!(form["line_items[0][price_data][unit_amount]"], "1500");
        assert_eq!(form["metadata[type]"], "deposit");
        assert_eq!(form["metadata[slot_id]"], Uuid::nil().to_string());
        assert_eq!(form["payment_method_types[1]"], "bancontact");
        assert_eq!(form["expires_at"], (1_700_000_000 + 45 * 60).to_string());

        assert_eq!(session_expires_at(hold_started_at, Some(5)), Some(1_700_000_000 + 30 * 60));
        assert_eq!(session_expires_at(hold_started_at, None), None);
    }
}
