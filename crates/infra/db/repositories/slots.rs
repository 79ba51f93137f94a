use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{payment_events, slots},
    },
};
use domain::{
    entities::{payment_events::ProcessedPaymentEventEntity, slots::SlotEntity},
    repositories::slots::SlotRepository,
    value_objects::{
        bookings::{FinalizeDepositModel, FinalizeOutcome, ReleaseHoldModel, ReleaseOutcome},
        enums::slot_statuses::SlotStatus,
    },
};

pub struct SlotPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SlotPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

// Ledger insert; zero rows means the event was already applied.
fn record_event(
    conn: &mut PgConnection,
    event_id: &str,
    slot_id: Uuid,
    event_type: &str,
) -> QueryResult<bool> {
    let inserted = insert_into(payment_events::table)
        .values(&ProcessedPaymentEventEntity {
            event_id: event_id.to_string(),
            slot_id,
            event_type: event_type.to_string(),
            received_at: Utc::now(),
        })
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(inserted > 0)
}

#[async_trait]
impl SlotRepository for SlotPostgres {
    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<SlotEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = slots::table
            .filter(slots::id.eq(slot_id))
            .select(SlotEntity::as_select())
            .first::<SlotEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_open_slots_for_providers(
        &self,
        provider_emails: Vec<String>,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<SlotEntity>> {
        if provider_emails.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = slots::table
            .filter(slots::provider_email.eq_any(provider_emails))
            .filter(slots::active.eq(true))
            .filter(slots::status.eq(SlotStatus::Open.as_str()))
            .filter(slots::slot_date.ge(date_from))
            .into_boxed();

        if let Some(date_to) = date_to {
            query = query.filter(slots::slot_date.le(date_to));
        }

        let results = query
            .order((slots::slot_date.asc(), slots::start_time.asc()))
            .select(SlotEntity::as_select())
            .load::<SlotEntity>(&mut conn)?;

        Ok(results)
    }

    async fn claim_open_slot(
        &self,
        slot_id: Uuid,
        target: SlotStatus,
        held_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(slots::table)
            .filter(slots::id.eq(slot_id))
            .filter(slots::status.eq(SlotStatus::Open.as_str()))
            .filter(slots::active.eq(true))
            .set((
                slots::status.eq(target.as_str()),
                slots::booked_at.eq(Some(held_at)),
            ))
            .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn finalize_deposit(&self, model: FinalizeDepositModel) -> Result<FinalizeOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<FinalizeOutcome, diesel::result::Error, _>(|conn| {
            if !record_event(conn, &model.event_id, model.slot_id, &model.event_type)? {
                return Ok(FinalizeOutcome::DuplicateEvent);
            }

            let finalized = update(slots::table)
                .filter(slots::id.eq(model.slot_id))
                .filter(slots::status.eq(SlotStatus::PendingDeposit.as_str()))
                .filter(slots::active.eq(true))
                .filter(slots::booked_at.eq(model.hold_started_at))
                .set(slots::status.eq(SlotStatus::Booked.as_str()))
                .returning(SlotEntity::as_returning())
                .get_result::<SlotEntity>(conn)
                .optional()?;

            if let Some(slot) = finalized {
                return Ok(FinalizeOutcome::Finalized(slot));
            }

            let current = slots::table
                .filter(slots::id.eq(model.slot_id))
                .select(slots::status)
                .first::<String>(conn)
                .optional()?;

            Ok(match current.as_deref().map(SlotStatus::from_str) {
                None => FinalizeOutcome::SlotNotFound,
                Some(Some(SlotStatus::Booked)) => FinalizeOutcome::AlreadyBooked,
                Some(status) => FinalizeOutcome::HoldNotActive(status),
            })
        })?;

        Ok(outcome)
    }

    async fn release_hold(&self, model: ReleaseHoldModel) -> Result<ReleaseOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<ReleaseOutcome, diesel::result::Error, _>(|conn| {
            if !record_event(conn, &model.event_id, model.slot_id, &model.event_type)? {
                return Ok(ReleaseOutcome::DuplicateEvent);
            }

            let released = update(slots::table)
                .filter(slots::id.eq(model.slot_id))
                .filter(slots::status.eq(SlotStatus::PendingDeposit.as_str()))
                .filter(slots::booked_at.eq(model.hold_started_at))
                .set((
                    slots::status.eq(SlotStatus::Open.as_str()),
                    slots::booked_at.eq(None::<DateTime<Utc>>),
                ))
                .execute(conn)?;

            Ok(if released == 1 {
                ReleaseOutcome::Released
            } else {
                ReleaseOutcome::NotHeld
            })
        })?;

        Ok(outcome)
    }

    async fn release_expired_holds(
        &self,
        cutoff: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired = slots::table
            .filter(slots::status.eq(SlotStatus::PendingDeposit.as_str()))
            .filter(slots::active.eq(true))
            .filter(slots::booked_at.lt(cutoff));

        if dry_run {
            let candidates = expired.select(slots::id).load::<Uuid>(&mut conn)?;
            return Ok(candidates);
        }

        let released = update(expired)
            .set((
                slots::status.eq(SlotStatus::Open.as_str()),
                slots::booked_at.eq(None::<DateTime<Utc>>),
            ))
            .returning(slots::id)
            .get_results::<Uuid>(&mut conn)?;

        Ok(released)
    }
}
