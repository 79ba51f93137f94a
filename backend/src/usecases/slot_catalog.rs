use std::{collections::HashMap, sync::Arc};

use chrono::{Local, NaiveDate};
use crates::domain::{
    entities::{profiles::ProfileEntity, slots::SlotEntity},
    repositories::{profiles::ProfileRepository, slots::SlotRepository},
    value_objects::{
        enums::account_statuses::AccountStatus,
        slot_search::{SlotSearchFilter, SlotSearchQuery},
    },
};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("slot store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl CatalogError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            CatalogError::StoreUnavailable(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSlots {
    pub profile: ProfileEntity,
    pub slots: Vec<SlotEntity>,
}

pub struct SlotCatalogUseCase {
    profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
    slot_repo: Arc<dyn SlotRepository + Send + Sync>,
}

impl SlotCatalogUseCase {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
        slot_repo: Arc<dyn SlotRepository + Send + Sync>,
    ) -> Self {
        Self {
            profile_repo,
            slot_repo,
        }
    }

    pub async fn search(&self, query: SlotSearchQuery) -> Result<Vec<ProviderSlots>, CatalogError> {
        self.search_on(query, Local::now().date_naive()).await
    }

    /// Providers in store order, each with its open slots sorted by date and
    /// start time. Providers without a matching slot are left out.
    pub async fn search_on(
        &self,
        query: SlotSearchQuery,
        today: NaiveDate,
    ) -> Result<Vec<ProviderSlots>, CatalogError> {
        let filter = SlotSearchFilter::sanitize(&query, today);

        let profiles = self
            .profile_repo
            .search_profiles(filter.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to search provider profiles");
                CatalogError::StoreUnavailable(err)
            })?;

        let profiles: Vec<ProfileEntity> = profiles
            .into_iter()
            .filter(|p| p.account_status() == AccountStatus::Active)
            .collect();
        if profiles.is_empty() {
            debug!("catalog: no provider matched");
            return Ok(Vec::new());
        }

        let emails: Vec<String> = profiles.iter().map(|p| p.email.to_lowercase()).collect();
        let slots = self
            .slot_repo
            .list_open_slots_for_providers(emails, filter.date_from, filter.date_to)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to list open slots");
                CatalogError::StoreUnavailable(err)
            })?;

        let mut grouped: HashMap<String, Vec<SlotEntity>> = HashMap::new();
        for slot in slots.into_iter().filter(SlotEntity::is_bookable) {
            grouped
                .entry(slot.provider_email.to_lowercase())
                .or_default()
                .push(slot);
        }

        let results: Vec<ProviderSlots> = profiles
            .into_iter()
            .filter_map(|profile| {
                let mut slots = grouped.remove(&profile.email.to_lowercase())?;
                slots.sort_by_key(|s| (s.slot_date, s.start_time));
                Some(ProviderSlots { profile, slots })
            })
            .collect();

        debug!(providers = results.len(), "catalog: search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use crates::domain::repositories::{
        profiles::MockProfileRepository, slots::MockSlotRepository,
    };
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
    }

    fn profile(email: &str, account_status: Option<&str>) -> ProfileEntity {
        ProfileEntity {
            email: email.to_string(),
            display_name: Some(email.to_string()),
            category: Some("hair".to_string()),
            street: None,
            postal_code: Some("9000".to_string()),
            city: Some("Gent".to_string()),
            website: None,
            bio: None,
            account_status: account_status.map(str::to_string),
            deposit_enabled: false,
            deposit_amount_minor: 0,
            iban: None,
            bic: None,
        }
    }

    fn slot(email: &str, day: u32, hour: u32, status: &str, active: bool) -> SlotEntity {
        SlotEntity {
            id: Uuid::new_v4(),
            provider_email: email.to_string(),
            slot_date: NaiveDate::from_ymd_opt(2025, 12, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            description: None,
            status: status.to_string(),
            active,
            booked_at: None,
            deposit_required: false,
            deposit_amount_minor: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn groups_sorts_and_omits_providers_without_slots() {
        let mut profile_repo = MockProfileRepository::new();
        let mut slot_repo = MockSlotRepository::new();

        let profiles = vec![
            profile("b@example.com", Some("active")),
            profile("a@example.com", None),
            profile("empty@example.com", None),
        ];
        profile_repo
            .expect_search_profiles()
            .returning(move |_| {
                let profiles = profiles.clone();
                Box::pin(async move { Ok(profiles) })
            });

        let slots = vec![
            slot("a@example.com", 2, 9, "open", true),
            slot("b@example.com", 3, 15, "open", true),
            slot("b@example.com", 1, 16, "open", true),
            slot("b@example.com", 1, 10, "open", true),
        ];
        slot_repo
            .expect_list_open_slots_for_providers()
            .withf(|emails, from, to| emails.len() == 3 && *from == today() && to.is_none())
            .returning(move |_, _, _| {
                let slots = slots.clone();
                Box::pin(async move { Ok(slots) })
            });

        let usecase = SlotCatalogUseCase::new(Arc::new(profile_repo), Arc::new(slot_repo));
        let results = usecase
            .search_on(SlotSearchQuery::default(), today())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].profile.email, "b@example.com");
        let b_starts: Vec<(u32, u32)> = results[0]
            .slots
            .iter()
            .map(|s| (chrono::Datelike::day(&s.slot_date), chrono::Timelike::hour(&s.start_time)))
            .collect();
        assert_eq!(b_starts, vec![(1, 10), (1, 16), (3, 15)]);
        assert_eq!(results[1].profile.email, "a@example.com");
    }

    #[tokio::test]
    async fn never_returns_inactive_or_taken_slots_or_suspended_providers() {
        let mut profile_repo = MockProfileRepository::new();
        let mut slot_repo = MockSlotRepository::new();

        let profiles = vec![
            profile("a@example.com", None),
            profile("banned@example.com", Some("suspended")),
        ];
        profile_repo.expect_search_profiles().returning(move |_| {
            let profiles = profiles.clone();
            Box::pin(async move { Ok(profiles) })
        });

        let slots = vec![
            slot("a@example.com", 2, 9, "open", false),
            slot("a@example.com", 2, 10, "booked", true),
            slot("a@example.com", 2, 11, "pending_deposit", true),
            slot("a@example.com", 2, 12, "open", true),
        ];
        slot_repo
            .expect_list_open_slots_for_providers()
            .withf(|emails, _, _| emails == &vec!["a@example.com".to_string()])
            .returning(move |_, _, _| {
                let slots = slots.clone();
                Box::pin(async move { Ok(slots) })
            });

        let usecase = SlotCatalogUseCase::new(Arc::new(profile_repo), Arc::new(slot_repo));
        let results = usecase
            .search_on(SlotSearchQuery::default(), today())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].slots.len(), 1);
        assert_eq!(results[0].slots[0].status, "open");
        assert!(results[0].slots[0].active);
    }

    #[tokio::test]
    async fn store_failure_is_retryable() {
        let mut profile_repo = MockProfileRepository::new();
        let slot_repo = MockSlotRepository::new();

        profile_repo
            .expect_search_profiles()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));

        let usecase = SlotCatalogUseCase::new(Arc::new(profile_repo), Arc::new(slot_repo));
        let err = usecase
            .search_on(SlotSearchQuery::default(), today())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
