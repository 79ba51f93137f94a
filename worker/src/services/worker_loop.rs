use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use crate::usecases::release_expired_holds::{
    ReleaseExpiredHoldsParams, ReleaseExpiredHoldsUseCase,
};

pub async fn run_worker_loop(
    usecase: Arc<ReleaseExpiredHoldsUseCase>,
    interval: Duration,
) -> Result<()> {
    if !usecase.is_enabled() {
        info!("deposit_holds: DEPOSIT_HOLD_TTL_MINUTES is not set, sweep disabled");
        return std::future::pending().await;
    }

    info!(
        interval_seconds = interval.as_secs(),
        "deposit_holds: sweep loop started"
    );
    loop {
        if let Err(err) = usecase.run(ReleaseExpiredHoldsParams { dry_run: false }).await {
            error!(error = %err, "deposit_holds: sweep failed");
        }

        tokio::time::sleep(interval).await;
    }
}
