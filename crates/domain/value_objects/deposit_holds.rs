use chrono::{DateTime, Duration, Utc};

/// Stripe only accepts checkout expiries between 30 minutes and 24 hours out.
pub const MIN_HOLD_TTL_MINUTES: i64 = 30;
pub const MAX_HOLD_TTL_MINUTES: i64 = 1440;
/// The checkout is opened right after the hold is claimed; the release grace
/// never drops below this so that gap is always covered.
pub const MIN_RELEASE_GRACE_MINUTES: i64 = 1;

/// Lifetime shared by a deposit hold and the checkout session opened for it.
///
/// The backend and the worker read `DEPOSIT_HOLD_TTL_MINUTES` independently;
/// both pass it through here so a hold is never released while its checkout
/// can still be paid. `None` means holds never expire.
pub fn effective_hold_ttl_minutes(configured: Option<i64>) -> Option<i64> {
    configured.map(|minutes| minutes.clamp(MIN_HOLD_TTL_MINUTES, MAX_HOLD_TTL_MINUTES))
}

/// Instant the checkout session created at `created_at` stops accepting payment.
pub fn checkout_expires_at(
    created_at: DateTime<Utc>,
    configured_ttl: Option<i64>,
) -> Option<DateTime<Utc>> {
    let ttl = effective_hold_ttl_minutes(configured_ttl)?;
    Some(created_at + Duration::minutes(ttl))
}

/// Holds started before the returned instant are abandoned.
pub fn release_cutoff(
    now: DateTime<Utc>,
    configured_ttl: Option<i64>,
    grace_minutes: i64,
) -> Option<DateTime<Utc>> {
    let ttl = effective_hold_ttl_minutes(configured_ttl)?;
    let grace = grace_minutes.max(MIN_RELEASE_GRACE_MINUTES);
    Some(now - Duration::minutes(ttl) - Duration::minutes(grace))
}
