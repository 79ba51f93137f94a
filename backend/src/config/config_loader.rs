use anyhow::{Context, Result};
use crates::payments::stripe_client::DEFAULT_WEBHOOK_TOLERANCE_SECONDS;
use url::Url;

use super::{
    config_model::{
        App, BackendServer, Database, Deposits, DotEnvyConfig, Notifications, Stripe,
    },
    stage::Stage,
};

const DEFAULT_APP_BASE_URL: &str = "http://localhost:8888";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")
            .map(|v| v.parse())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?
            .unwrap_or(10),
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        webhook_tolerance_seconds: optional("STRIPE_WEBHOOK_TOLERANCE_SECONDS")
            .map(|v| v.parse())
            .transpose()
            .context("STRIPE_WEBHOOK_TOLERANCE_SECONDS is invalid")?
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECONDS),
        payment_method_types: optional("STRIPE_PAYMENT_METHOD_TYPES")
            .map(|v| parse_csv(&v))
            .unwrap_or_default(),
    };

    let deposits = Deposits {
        currency: optional("DEPOSIT_CURRENCY")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| "eur".to_string()),
        hold_ttl_minutes: parse_positive_minutes(optional("DEPOSIT_HOLD_TTL_MINUTES"))
            .context("DEPOSIT_HOLD_TTL_MINUTES is invalid")?,
    };

    let app = App {
        base_url: Url::parse(
            &optional("APP_BASE_URL").unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_string()),
        )
        .context("APP_BASE_URL is invalid")?,
    };

    let notifications = Notifications {
        webhook_url: optional("BOOKING_NOTIFY_WEBHOOK_URL")
            .map(|v| Url::parse(&v))
            .transpose()
            .context("BOOKING_NOTIFY_WEBHOOK_URL is invalid")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        stripe,
        deposits,
        app,
        notifications,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or_default();
    Stage::parse(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is missing"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

pub(crate) fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// An unset TTL disables hold expiry; zero or negative values are rejected
/// rather than silently meaning "no TTL".
pub(crate) fn parse_positive_minutes(raw: Option<String>) -> Result<Option<i64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let minutes: i64 = raw.parse()?;
    if minutes <= 0 {
        anyhow::bail!("must be a positive number of minutes, got {minutes}");
    }
    Ok(Some(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_payment_method_csv() {
        assert_eq!(
            parse_csv(" card, Bancontact ,,ideal "),
            vec!["card", "bancontact", "ideal"]
        );
        assert!(parse_csv(" , ").is_empty());
    }

    #[test]
    fn hold_ttl_is_opt_in_and_positive() {
        assert_eq!(parse_positive_minutes(None).unwrap(), None);
        assert_eq!(parse_positive_minutes(Some("45".to_string())).unwrap(), Some(45));
        assert!(parse_positive_minutes(Some("0".to_string())).is_err());
        assert!(parse_positive_minutes(Some("soon".to_string())).is_err());
    }
}
