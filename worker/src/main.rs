use anyhow::Result;
use crates::domain::{
    repositories::{bookings::BookingRepository, slots::SlotRepository},
    value_objects::deposit_holds::effective_hold_ttl_minutes,
};
use crates::infra::db::{
    postgres::postgres_connection,
    repositories::{bookings::BookingPostgres, slots::SlotPostgres},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use worker::{
    axum_http, config,
    services::worker_loop,
    usecases::release_expired_holds::{HoldPolicy, ReleaseExpiredHoldsUseCase},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let slot_repository: Arc<dyn SlotRepository + Send + Sync> =
        Arc::new(SlotPostgres::new(Arc::clone(&db_pool_arc)));
    let booking_repository: Arc<dyn BookingRepository + Send + Sync> =
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool_arc)));

    let holds = &dotenvy_env.deposit_holds;
    let effective_ttl = effective_hold_ttl_minutes(holds.hold_ttl_minutes);
    if effective_ttl != holds.hold_ttl_minutes {
        warn!(
            configured = ?holds.hold_ttl_minutes,
            effective = ?effective_ttl,
            "deposit_holds: ttl clamped to the checkout session limits"
        );
    }
    info!(
        hold_ttl_minutes = ?effective_ttl,
        grace_minutes = holds.grace_minutes,
        "deposit_holds: release policy loaded; backend must use the same DEPOSIT_HOLD_TTL_MINUTES"
    );
    let release_usecase = Arc::new(ReleaseExpiredHoldsUseCase::new(
        slot_repository,
        booking_repository,
        HoldPolicy {
            ttl_minutes: holds.hold_ttl_minutes,
            grace_minutes: holds.grace_minutes,
        },
    ));

    // Spawn background loop
    let sweep_loop = tokio::spawn(worker_loop::run_worker_loop(
        Arc::clone(&release_usecase),
        Duration::from_secs(holds.sweep_interval_seconds),
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let internal_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, release_usecase).await
    });

    tokio::select! {
        result = sweep_loop => result??,
        result = internal_server => result??,
    };
    Ok(())
}
