use super::config_model::{Database, DepositHolds, DotEnvyConfig, WorkerServer};
use anyhow::{Context, Result};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: required("SERVER_PORT_WORKER")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
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
            .unwrap_or(2),
    };

    let deposit_holds = DepositHolds {
        hold_ttl_minutes: parse_positive(optional("DEPOSIT_HOLD_TTL_MINUTES"))
            .context("DEPOSIT_HOLD_TTL_MINUTES is invalid")?,
        grace_minutes: optional("DEPOSIT_RELEASE_GRACE_MINUTES")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(10),
        sweep_interval_seconds: parse_positive(optional("DEPOSIT_SWEEP_INTERVAL_SECONDS"))
            .context("DEPOSIT_SWEEP_INTERVAL_SECONDS is invalid")?
            .map(|v| v as u64)
            .unwrap_or(60),
        internal_token: optional("INTERNAL_SWEEP_TOKEN"),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        deposit_holds,
    })
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

fn parse_positive(raw: Option<String>) -> Result<Option<i64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let value: i64 = raw.parse()?;
    if value <= 0 {
        anyhow::bail!("must be positive, got {value}");
    }
    Ok(Some(value))
}
