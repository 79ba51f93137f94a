use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::{bookings::BookingRepository, slots::SlotRepository},
    value_objects::deposit_holds::release_cutoff,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// At most this many ids are echoed back in a sweep result.
const REPORTED_IDS_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("deposit hold ttl is not configured")]
    Disabled,
    #[error("slot store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldPolicy {
    pub ttl_minutes: Option<i64>,
    pub grace_minutes: i64,
}

impl HoldPolicy {
    /// Holds started before the returned instant are abandoned. `None` when
    /// no TTL is configured. The TTL is clamped exactly as the checkout
    /// session expiry is, so a payable checkout always keeps its hold.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        release_cutoff(now, self.ttl_minutes, self.grace_minutes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseExpiredHoldsParams {
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseExpiredHoldsResult {
    pub cutoff: DateTime<Utc>,
    pub released: usize,
    pub bookings_expired: usize,
    pub released_ids: Vec<Uuid>,
    pub dry_run: bool,
}

pub struct ReleaseExpiredHoldsUseCase {
    slot_repo: Arc<dyn SlotRepository + Send + Sync>,
    booking_repo: Arc<dyn BookingRepository + Send + Sync>,
    policy: HoldPolicy,
}

impl ReleaseExpiredHoldsUseCase {
    pub fn new(
        slot_repo: Arc<dyn SlotRepository + Send + Sync>,
        booking_repo: Arc<dyn BookingRepository + Send + Sync>,
        policy: HoldPolicy,
    ) -> Self {
        Self {
            slot_repo,
            booking_repo,
            policy,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.ttl_minutes.is_some()
    }

    pub async fn run(
        &self,
        params: ReleaseExpiredHoldsParams,
    ) -> Result<ReleaseExpiredHoldsResult, SweepError> {
        self.run_at(params, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        params: ReleaseExpiredHoldsParams,
        now: DateTime<Utc>,
    ) -> Result<ReleaseExpiredHoldsResult, SweepError> {
        let cutoff = self.policy.cutoff(now).ok_or(SweepError::Disabled)?;

        let released_ids = self
            .slot_repo
            .release_expired_holds(cutoff, params.dry_run)
            .await
            .map_err(|err| {
                error!(%cutoff, db_error = ?err, "deposit_holds: failed to release expired holds");
                SweepError::StoreUnavailable(err)
            })?;

        let mut bookings_expired = 0;
        if !params.dry_run && !released_ids.is_empty() {
            // The slot rows are already open again; a miss here only leaves
            // stale audit rows behind.
            match self
                .booking_repo
                .mark_bookings_expired(released_ids.clone())
                .await
            {
                Ok(affected) => bookings_expired = affected,
                Err(err) => {
                    warn!(db_error = ?err, "deposit_holds: bookings not marked expired")
                }
            }
        }

        let result = ReleaseExpiredHoldsResult {
            cutoff,
            released: released_ids.len(),
            bookings_expired,
            released_ids: released_ids.into_iter().take(REPORTED_IDS_LIMIT).collect(),
            dry_run: params.dry_run,
        };

        info!(
            %cutoff,
            released = result.released,
            bookings_expired = result.bookings_expired,
            dry_run = result.dry_run,
            "deposit_holds: sweep completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crates::payments::stripe_client::session_expires_at;
    use crates::domain::repositories::{
        bookings::MockBookingRepository, slots::MockSlotRepository,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap()
    }

    fn policy(ttl_minutes: Option<i64>) -> HoldPolicy {
        HoldPolicy {
            ttl_minutes,
            grace_minutes: 10,
        }
    }

    #[test]
    fn cutoff_adds_grace_to_ttl() {
        assert_eq!(
            policy(Some(30)).cutoff(now()),
            Some(Utc.with_ymd_and_hms(2025, 12, 1, 11, 20, 0).unwrap())
        );
        assert_eq!(policy(None).cutoff(now()), None);
    }

    #[test]
    fn short_ttl_waits_for_checkout_expiry() {
        let hold_started_at = now();
        let policy = HoldPolicy {
            ttl_minutes: Some(5),
            grace_minutes: 10,
        };
        let checkout_closes =
            session_expires_at(hold_started_at, policy.ttl_minutes).unwrap();

        // Sixteen minutes in, the checkout is still payable.
        let cutoff = policy.cutoff(hold_started_at + Duration::minutes(16)).unwrap();
        assert!(cutoff < hold_started_at);

        for ttl in [1, 5, 29, 30, 31, 90, 1440, 5000] {
            let policy = HoldPolicy {
                ttl_minutes: Some(ttl),
                grace_minutes: 0,
            };
            let expires_at = Utc
                .timestamp_opt(session_expires_at(hold_started_at, Some(ttl)).unwrap(), 0)
                .unwrap();
            assert!(policy.cutoff(expires_at).unwrap() <= hold_started_at, "ttl={ttl}");
        }
        assert_eq!(checkout_closes, (hold_started_at + Duration::minutes(30)).timestamp());
    }

    #[tokio::test]
    async fn releases_old_holds_and_expires_their_bookings() {
        let stale = vec![Uuid::new_v4(), Uuid::new_v4()];
        let expected_cutoff = Utc.with_ymd_and_hms(2025, 12, 1, 11, 20, 0).unwrap();

        let mut slot_repo = MockSlotRepository::new();
        let released = stale.clone();
        slot_repo
            .expect_release_expired_holds()
            .withf(move |cutoff, dry_run| *cutoff == expected_cutoff && !*dry_run)
            .times(1)
            .returning(move |_, _| {
                let released = released.clone();
                Box::pin(async move { Ok(released) })
            });

        let mut booking_repo = MockBookingRepository::new();
        let expired = stale.clone();
        booking_repo
            .expect_mark_bookings_expired()
            .withf(move |ids| ids == &expired)
            .times(1)
            .returning(|ids| {
                let affected = ids.len();
                Box::pin(async move { Ok(affected) })
            });

        let usecase = ReleaseExpiredHoldsUseCase::new(
            Arc::new(slot_repo),
            Arc::new(booking_repo),
            policy(Some(30)),
        );
        let result = usecase
            .run_at(ReleaseExpiredHoldsParams { dry_run: false }, now())
            .await
            .unwrap();

        assert_eq!(result.released, 2);
        assert_eq!(result.bookings_expired, 2);
        assert_eq!(result.released_ids, stale);
    }

    #[tokio::test]
    async fn dry_run_only_reports_candidates() {
        let mut slot_repo = MockSlotRepository::new();
        slot_repo
            .expect_release_expired_holds()
            .withf(|_, dry_run| *dry_run)
            .returning(|_, _| Box::pin(async { Ok(vec![Uuid::new_v4()]) }));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_mark_bookings_expired().never();

        let usecase = ReleaseExpiredHoldsUseCase::new(
            Arc::new(slot_repo),
            Arc::new(booking_repo),
            policy(Some(30)),
        );
        let result = usecase
            .run_at(ReleaseExpiredHoldsParams { dry_run: true }, now())
            .await
            .unwrap();

        assert_eq!(result.released, 1);
        assert_eq!(result.bookings_expired, 0);
        assert!(result.dry_run);
    }

    #[tokio::test]
    async fn disabled_without_ttl() {
        let mut slot_repo = MockSlotRepository::new();
        slot_repo.expect_release_expired_holds().never();

        let usecase = ReleaseExpiredHoldsUseCase::new(
            Arc::new(slot_repo),
            Arc::new(MockBookingRepository::new()),
            policy(None),
        );

        assert!(!usecase.is_enabled());
        let err = usecase
            .run_at(ReleaseExpiredHoldsParams::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::Disabled));
    }

    #[tokio::test]
    async fn booking_audit_failure_does_not_fail_the_sweep() {
        let mut slot_repo = MockSlotRepository::new();
        slot_repo
            .expect_release_expired_holds()
            .returning(|_, _| Box::pin(async { Ok(vec![Uuid::new_v4()]) }));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_mark_bookings_expired()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("deadlock detected")) }));

        let usecase = ReleaseExpiredHoldsUseCase::new(
            Arc::new(slot_repo),
            Arc::new(booking_repo),
            policy(Some(30)),
        );
        let result = usecase
            .run_at(ReleaseExpiredHoldsParams::default(), now())
            .await
            .unwrap();

        assert_eq!(result.released, 1);
        assert_eq!(result.bookings_expired, 0);
    }
}
