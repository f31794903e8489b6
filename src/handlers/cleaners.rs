use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db;
use crate::errors::{AppError, AppResult};
use crate::handlers::auth::AuthUser;
use crate::models::{Availability, CleanerProfile, ServiceArea, TimeWindow};
use crate::services::cleaners::{self, AvailabilityInput, ServiceAreaInput, SetTierInput, UpdateProfileInput};
use crate::services::matching;
use crate::services::pricing::{self, PriceBreakdown, QuoteInput};
use crate::state::AppState;

// ── Search ──

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    city: String,
    neighborhood: Option<String>,
}

// GET /api/cleaners/area?city=&neighborhood=
pub async fn cleaners_in_area(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AreaQuery>,
) -> AppResult<Json<Vec<CleanerProfile>>> {
    if query.city.trim().is_empty() {
        return Err(AppError::validation("city is required"));
    }
    let db = state.conn()?;
    let found = matching::find_cleaners_in_area(&db, query.city.trim(), query.neighborhood.as_deref())?;
    Ok(Json(found))
}

// GET /api/cleaners/postal/:code
pub async fn cleaners_by_postal_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<Json<Vec<CleanerProfile>>> {
    let db = state.conn()?;
    Ok(Json(matching::find_cleaners_by_postal_code(&db, code.trim())?))
}

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    date: NaiveDate,
    start: String,
    end: String,
    /// Comma-separated service area ids.
    areas: Option<String>,
}

// GET /api/cleaners/available?date=&start=&end=&areas=
pub async fn available_cleaners(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<Vec<CleanerProfile>>> {
    let window = TimeWindow::new(&query.start, &query.end).map_err(|e| AppError::validation(e.to_string()))?;
    let area_ids: Vec<String> = query
        .areas
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let db = state.conn()?;
    let found = matching::find_available_cleaners(&db, query.date, &window, &area_ids)?;
    Ok(Json(found))
}

// POST /api/pricing/quote
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(input): Json<QuoteInput>,
) -> AppResult<Json<PriceBreakdown>> {
    let db = state.conn()?;
    let breakdown = pricing::quote(&db, &input, state.config.platform_fee_percentage)?;
    Ok(Json(breakdown))
}

// ── Cleaner self-service ──

// GET /api/cleaner/profile
pub async fn my_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<CleanerProfile>> {
    let db = state.conn()?;
    Ok(Json(cleaners::my_profile(&db, &user)?))
}

// PUT /api/cleaner/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<CleanerProfile>> {
    let db = state.conn()?;
    Ok(Json(cleaners::update_profile(&db, &user, &input)?))
}

// GET /api/cleaner/areas
pub async fn my_service_areas(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ServiceArea>>> {
    let db = state.conn()?;
    Ok(Json(cleaners::my_service_areas(&db, &user)?))
}

// POST /api/cleaner/areas
pub async fn add_service_area(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<ServiceAreaInput>,
) -> AppResult<(StatusCode, Json<ServiceArea>)> {
    let db = state.conn()?;
    let area = cleaners::add_service_area(&db, &user, &input, db::now())?;
    Ok((StatusCode::CREATED, Json(area)))
}

// DELETE /api/cleaner/areas/:id
pub async fn remove_service_area(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let db = state.conn()?;
    cleaners::remove_service_area(&db, &user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/cleaner/availability
pub async fn my_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Availability>>> {
    let db = state.conn()?;
    Ok(Json(cleaners::my_availability(&db, &user)?))
}

// POST /api/cleaner/availability
pub async fn add_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<AvailabilityInput>,
) -> AppResult<(StatusCode, Json<Availability>)> {
    let db = state.conn()?;
    let entry = cleaners::add_availability(&db, &user, &input, db::now())?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// DELETE /api/cleaner/availability/:id
pub async fn remove_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let db = state.conn()?;
    cleaners::remove_availability(&db, &user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/admin/cleaners/:id/tier
pub async fn set_tier(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<SetTierInput>,
) -> AppResult<Json<CleanerProfile>> {
    let db = state.conn()?;
    Ok(Json(cleaners::set_tier(&db, &user, &id, &input)?))
}
