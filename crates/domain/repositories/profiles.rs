use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::profiles::ProfileEntity, value_objects::slot_search::SlotSearchFilter,
};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<ProfileEntity>>;

    /// Providers that are not suspended and match the filter's text and
    /// category criteria, in store order, capped at the filter's limit.
    async fn search_profiles(&self, filter: SlotSearchFilter) -> Result<Vec<ProfileEntity>>;
}
