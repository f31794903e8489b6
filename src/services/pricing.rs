use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{CleanerProfile, ServiceAddOn, ServiceAddOnDefinition, ServiceDefinition, ServiceType};
use crate::services::matching;

/// Every amount is in bani.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub hourly_rate: i64,
    pub service_price: i64,
    pub add_ons_price: i64,
    pub travel_fee: i64,
    pub subtotal: i64,
    pub platform_fee: i64,
    pub total_price: i64,
    pub cleaner_payout: i64,
    pub estimated_hours: f64,
}

impl PriceBreakdown {
    pub fn duration_minutes(&self) -> i32 {
        (self.estimated_hours * 60.0).round() as i32
    }
}

/// Prices a job for one cleaner. Unknown or inactive add-ons contribute
/// nothing; each requested add-on is counted once.
pub fn calculate_price(
    profile: &CleanerProfile,
    service: &ServiceDefinition,
    add_on_catalog: &[ServiceAddOnDefinition],
    requested_add_ons: &[ServiceAddOn],
    travel_fee: i64,
    platform_fee_percentage: f64,
) -> AppResult<PriceBreakdown> {
    if !profile.is_active {
        return Err(AppError::validation("cleaner is not accepting bookings"));
    }
    if !service.is_active {
        return Err(AppError::validation(format!(
            "service {} is not currently offered",
            service.service_type.as_str()
        )));
    }
    if travel_fee < 0 {
        return Err(AppError::validation("travel fee cannot be negative"));
    }

    let service_price =
        (profile.hourly_rate as f64 * service.base_hours * service.price_multiplier).floor() as i64;

    let selected = add_on_catalog
        .iter()
        .filter(|def| def.is_active && requested_add_ons.contains(&def.add_on));
    let (add_ons_price, add_on_hours) = selected.fold((0i64, 0f64), |(price, hours), def| {
        (price + def.fixed_price, hours + def.estimated_hours)
    });

    let subtotal = service_price + add_ons_price + travel_fee;
    let platform_fee = (subtotal as f64 * platform_fee_percentage / 100.0).floor() as i64;

    Ok(PriceBreakdown {
        hourly_rate: profile.hourly_rate,
        service_price,
        add_ons_price,
        travel_fee,
        subtotal,
        platform_fee,
        total_price: subtotal + platform_fee,
        cleaner_payout: subtotal - platform_fee,
        estimated_hours: service.base_hours + add_on_hours,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteInput {
    pub cleaner_profile_id: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub add_ons: Vec<ServiceAddOn>,
    /// When given, the travel fee comes from the cleaner's service areas.
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
}

pub fn quote(conn: &Connection, input: &QuoteInput, platform_fee_percentage: f64) -> AppResult<PriceBreakdown> {
    let profile = queries::get_cleaner_profile(conn, &input.cleaner_profile_id)?
        .ok_or(AppError::NotFound("cleaner"))?;
    let service = queries::get_service_definition(conn, input.service_type)?
        .ok_or(AppError::NotFound("service"))?;
    let catalog = queries::list_add_on_definitions(conn)?;

    let travel_fee = match input.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(city) => {
            let areas = queries::list_service_areas(conn, &profile.id)?;
            matching::resolve_travel_fee(
                &areas,
                city,
                input.neighborhood.as_deref(),
                input.postal_code.as_deref(),
            )
            .ok_or_else(|| AppError::validation("cleaner does not service this address"))?
        }
        None => 0,
    };

    calculate_price(
        &profile,
        &service,
        &catalog,
        &input.add_ons,
        travel_fee,
        platform_fee_percentage,
    )
}
