use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::profiles},
};
use domain::{
    entities::profiles::ProfileEntity, repositories::profiles::ProfileRepository,
    value_objects::{enums::account_statuses::AccountStatus, slot_search::SlotSearchFilter},
};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_email(&self, email: &str) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::email.eq(email.trim().to_lowercase()))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn search_profiles(&self, filter: SlotSearchFilter) -> Result<Vec<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // ILIKE without wildcards is a case-insensitive equality.
        let mut query = profiles::table
            .filter(
                profiles::account_status
                    .is_null()
                    .or(profiles::account_status.ilike(AccountStatus::Active.as_str())),
            )
            .into_boxed();

        if let Some(pattern) = filter.query_pattern {
            query = query.filter(
                profiles::display_name
                    .ilike(pattern.clone())
                    .or(profiles::email.ilike(pattern)),
            );
        }

        if let Some(pattern) = filter.location_pattern {
            query = query.filter(
                profiles::city
                    .ilike(pattern.clone())
                    .or(profiles::postal_code.ilike(pattern.clone()))
                    .or(profiles::street.ilike(pattern)),
            );
        }

        if let Some(category) = filter.category {
            query = query.filter(profiles::category.eq(category));
        }

        let results = query
            .limit(filter.provider_limit)
            .select(ProfileEntity::as_select())
            .load::<ProfileEntity>(&mut conn)?;

        Ok(results)
    }
}
