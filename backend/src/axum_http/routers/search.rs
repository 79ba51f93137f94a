use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use chrono::NaiveDate;
use crates::domain::{
    entities::{profiles::ProfileEntity, slots::SlotEntity},
    value_objects::slot_search::SlotSearchQuery,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    axum_http::error_responses::AppError,
    usecases::slot_catalog::{ProviderSlots, SlotCatalogUseCase},
};

pub fn routes(catalog_usecase: Arc<SlotCatalogUseCase>) -> Router {
    Router::new()
        .route("/search", post(search))
        .with_state(catalog_usecase)
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub profiles: Vec<ProfileResponse>,
    pub slots: Vec<SlotResponse>,
}

/// Public provider card. Bank details are never part of it.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub name: Option<String>,
    pub cat: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub deposit_enabled: bool,
    pub deposit_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub id: Uuid,
    pub email: String,
    pub date: NaiveDate,
    pub from: String,
    pub to: String,
    pub desc: Option<String>,
    pub status: String,
}

impl From<ProfileEntity> for ProfileResponse {
    fn from(profile: ProfileEntity) -> Self {
        Self {
            email: profile.email,
            name: profile.display_name,
            cat: profile.category,
            street: profile.street,
            postcode: profile.postal_code,
            city: profile.city,
            website: profile.website,
            bio: profile.bio,
            deposit_enabled: profile.deposit_enabled,
            deposit_amount: major_units(profile.deposit_amount_minor),
        }
    }
}

impl From<SlotEntity> for SlotResponse {
    fn from(slot: SlotEntity) -> Self {
        Self {
            id: slot.id,
            email: slot.provider_email,
            date: slot.slot_date,
            from: slot.start_time.format("%H:%M").to_string(),
            to: slot.end_time.format("%H:%M").to_string(),
            desc: slot.description,
            status: slot.status,
        }
    }
}

pub(crate) fn major_units(amount_minor: i32) -> f64 {
    f64::from(amount_minor) / 100.0
}

// The body is optional and loosely shaped; anything unreadable searches
// with no criteria.
pub async fn search(
    State(catalog_usecase): State<Arc<SlotCatalogUseCase>>,
    body: Bytes,
) -> Result<Json<SearchResponse>, AppError> {
    let query: SlotSearchQuery = serde_json::from_slice(&body).unwrap_or_default();

    let results = catalog_usecase.search(query).await?;

    let mut response = SearchResponse {
        profiles: Vec::with_capacity(results.len()),
        slots: Vec::new(),
    };
    for ProviderSlots { profile, slots } in results {
        response.profiles.push(profile.into());
        response.slots.extend(slots.into_iter().map(SlotResponse::from));
    }

    Ok(Json(response))
}
