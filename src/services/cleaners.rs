use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Availability, AvailabilityType, CleanerProfile, ServiceArea, Tier, TimeWindow, User};

pub fn my_profile(conn: &Connection, user: &User) -> AppResult<CleanerProfile> {
    queries::get_cleaner_profile_by_user(conn, &user.id)?.ok_or(AppError::NotFound("cleaner profile"))
}

fn check_rate(tier: Tier, rate: i64) -> AppResult<()> {
    if tier.is_rate_valid(rate) {
        return Ok(());
    }
    Err(AppError::validation(format!(
        "hourly rate {rate} is outside the {} tier range {}-{}",
        tier.as_str(),
        tier.min_rate(),
        tier.max_rate()
    )))
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileInput {
    pub hourly_rate: i64,
    pub bio: Option<String>,
}

pub fn update_profile(conn: &Connection, user: &User, input: &UpdateProfileInput) -> AppResult<CleanerProfile> {
    let profile = my_profile(conn, user)?;
    check_rate(profile.tier, input.hourly_rate)?;
    queries::update_cleaner_rate(conn, &profile.id, input.hourly_rate, input.bio.as_deref())?;
    my_profile(conn, user)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetTierInput {
    pub tier: Tier,
    /// Defaults to the current rate clamped into the new tier's range.
    pub hourly_rate: Option<i64>,
}

pub fn set_tier(conn: &Connection, actor: &User, profile_id: &str, input: &SetTierInput) -> AppResult<CleanerProfile> {
    if !actor.role.is_global_admin() {
        return Err(AppError::Forbidden);
    }
    let profile = queries::get_cleaner_profile(conn, profile_id)?.ok_or(AppError::NotFound("cleaner profile"))?;
    let rate = input
        .hourly_rate
        .unwrap_or_else(|| profile.hourly_rate.clamp(input.tier.min_rate(), input.tier.max_rate()));
    check_rate(input.tier, rate)?;

    queries::update_cleaner_tier(conn, profile_id, input.tier, rate)?;
    tracing::info!(cleaner_profile_id = %profile_id, tier = input.tier.as_str(), rate, "tier changed");
    queries::get_cleaner_profile(conn, profile_id)?.ok_or(AppError::NotFound("cleaner profile"))
}

// ── Service areas ──

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAreaInput {
    pub city: String,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub travel_fee: i64,
    #[serde(default)]
    pub is_preferred: bool,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn add_service_area(
    conn: &Connection,
    user: &User,
    input: &ServiceAreaInput,
    now: NaiveDateTime,
) -> AppResult<ServiceArea> {
    let profile = my_profile(conn, user)?;
    if input.city.trim().is_empty() {
        return Err(AppError::validation("city is required"));
    }
    if input.travel_fee < 0 {
        return Err(AppError::validation("travel fee cannot be negative"));
    }

    let area = ServiceArea {
        id: uuid::Uuid::new_v4().to_string(),
        cleaner_profile_id: profile.id,
        city: input.city.trim().to_string(),
        neighborhood: trimmed(&input.neighborhood),
        postal_code: trimmed(&input.postal_code),
        travel_fee: input.travel_fee,
        is_preferred: input.is_preferred,
        created_at: now,
    };
    queries::create_service_area(conn, &area)?;
    Ok(area)
}

pub fn my_service_areas(conn: &Connection, user: &User) -> AppResult<Vec<ServiceArea>> {
    let profile = my_profile(conn, user)?;
    Ok(queries::list_service_areas(conn, &profile.id)?)
}

pub fn remove_service_area(conn: &Connection, user: &User, id: &str) -> AppResult<()> {
    let profile = my_profile(conn, user)?;
    if !queries::delete_service_area(conn, id, &profile.id)? {
        return Err(AppError::NotFound("service area"));
    }
    Ok(())
}

// ── Availability ──

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityInput {
    pub kind: AvailabilityType,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub recurring_weekly: bool,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub fn add_availability(
    conn: &Connection,
    user: &User,
    input: &AvailabilityInput,
    now: NaiveDateTime,
) -> AppResult<Availability> {
    let profile = my_profile(conn, user)?;
    let window = TimeWindow::new(&input.start_time, &input.end_time)
        .map_err(|e| AppError::validation(e.to_string()))?;

    if let Some(end) = input.recurrence_end_date {
        if !input.recurring_weekly {
            return Err(AppError::validation("recurrence end date needs a weekly entry"));
        }
        if end < input.date {
            return Err(AppError::validation("recurrence cannot end before it starts"));
        }
    }

    let entry = Availability {
        id: uuid::Uuid::new_v4().to_string(),
        cleaner_profile_id: profile.id,
        kind: input.kind,
        date: input.date,
        start_time: window.start,
        end_time: window.end,
        recurring_weekly: input.recurring_weekly,
        recurrence_end_date: input.recurrence_end_date,
        notes: input.notes.clone(),
        created_at: now,
    };
    queries::create_availability(conn, &entry)?;
    Ok(entry)
}

pub fn my_availability(conn: &Connection, user: &User) -> AppResult<Vec<Availability>> {
    let profile = my_profile(conn, user)?;
    Ok(queries::list_availability(conn, &profile.id)?)
}

pub fn remove_availability(conn: &Connection, user: &User, id: &str) -> AppResult<()> {
    let profile = my_profile(conn, user)?;
    if !queries::delete_availability(conn, id, &profile.id)? {
        return Err(AppError::NotFound("availability entry"));
    }
    Ok(())
}
