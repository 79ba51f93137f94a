use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::slots::SlotEntity,
    value_objects::{
        bookings::{FinalizeDepositModel, FinalizeOutcome, ReleaseHoldModel, ReleaseOutcome},
        enums::slot_statuses::SlotStatus,
    },
};

#[async_trait]
#[automock]
pub trait SlotRepository {
    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<SlotEntity>>;

    /// Active, open slots of the given providers on or after `date_from`
    /// and, when set, on or before `date_to`; ordered by date then start.
    async fn list_open_slots_for_providers(
        &self,
        provider_emails: Vec<String>,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<SlotEntity>>;

    /// Compare-and-set `open -> target`. Returns `false` when another writer
    /// got there first or the slot is inactive.
    async fn claim_open_slot(
        &self,
        slot_id: Uuid,
        target: SlotStatus,
        held_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn finalize_deposit(&self, model: FinalizeDepositModel) -> Result<FinalizeOutcome>;

    async fn release_hold(&self, model: ReleaseHoldModel) -> Result<ReleaseOutcome>;

    /// Releases every hold started before `cutoff`. With `dry_run` nothing
    /// is written and the candidates are returned.
    async fn release_expired_holds(
        &self,
        cutoff: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<Vec<Uuid>>;
}
