use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{CleanerProfile, ServiceArea, TimeWindow};

/// Whether the cleaner has no unavailability overlapping `window` on `date`.
pub fn is_cleaner_available(
    conn: &Connection,
    cleaner_profile_id: &str,
    date: NaiveDate,
    window: &TimeWindow,
) -> AppResult<bool> {
    let entries = queries::list_unavailability_covering(conn, cleaner_profile_id, &date)?;
    Ok(!entries.iter().any(|entry| entry.blocks(date, window)))
}

/// Whether a confirmed or in-progress booking already occupies part of
/// `window` on `date`.
pub fn has_booking_conflict(
    conn: &Connection,
    cleaner_profile_id: &str,
    date: NaiveDate,
    window: &TimeWindow,
) -> AppResult<bool> {
    let bookings = queries::list_schedule_blocking_bookings(conn, cleaner_profile_id, &date)?;
    Ok(bookings.iter().any(|b| {
        match TimeWindow::from_duration(&b.scheduled_time, b.duration_minutes) {
            Ok(booked) => booked.overlaps(window),
            Err(e) => {
                tracing::warn!(booking_id = %b.id, "unreadable booking time: {e}");
                false
            }
        }
    }))
}

pub fn is_slot_free(
    conn: &Connection,
    cleaner_profile_id: &str,
    date: NaiveDate,
    window: &TimeWindow,
) -> AppResult<bool> {
    Ok(is_cleaner_available(conn, cleaner_profile_id, date, window)?
        && !has_booking_conflict(conn, cleaner_profile_id, date, window)?)
}

/// Active cleaners free for `window` on `date`, best rated first. When
/// `service_area_ids` is non-empty only owners of those areas are considered.
pub fn find_available_cleaners(
    conn: &Connection,
    date: NaiveDate,
    window: &TimeWindow,
    service_area_ids: &[String],
) -> AppResult<Vec<CleanerProfile>> {
    let candidates = if service_area_ids.is_empty() {
        queries::list_active_cleaner_profiles(conn)?
    } else {
        queries::list_profiles_for_areas(conn, service_area_ids)?
    };

    let mut available = Vec::with_capacity(candidates.len());
    for profile in candidates {
        if is_slot_free(conn, &profile.id, date, window)? {
            available.push(profile);
        }
    }
    Ok(available)
}

pub fn find_cleaners_in_area(
    conn: &Connection,
    city: &str,
    neighborhood: Option<&str>,
) -> AppResult<Vec<CleanerProfile>> {
    let neighborhood = neighborhood.map(str::trim).filter(|n| !n.is_empty());
    Ok(queries::find_profiles_in_area(conn, city, neighborhood)?)
}

pub fn find_cleaners_by_postal_code(conn: &Connection, postal_code: &str) -> AppResult<Vec<CleanerProfile>> {
    Ok(queries::find_profiles_by_postal_code(conn, postal_code)?)
}

fn same(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Travel fee for a location, taken from the most specific matching area:
/// exact postal code, then neighborhood within the same city, then a
/// city-wide area. `None` when no area covers the location.
pub fn resolve_travel_fee(
    areas: &[ServiceArea],
    city: &str,
    neighborhood: Option<&str>,
    postal_code: Option<&str>,
) -> Option<i64> {
    if let Some(postal) = filled(postal_code) {
        if let Some(area) = areas
            .iter()
            .find(|a| filled(a.postal_code.as_deref()) == Some(postal))
        {
            return Some(area.travel_fee);
        }
    }

    if let Some(hood) = filled(neighborhood) {
        if let Some(area) = areas.iter().find(|a| {
            same(&a.city, city) && filled(a.neighborhood.as_deref()).is_some_and(|n| same(n, hood))
        }) {
            return Some(area.travel_fee);
        }
    }

    areas
        .iter()
        .find(|a| a.is_city_wide() && same(&a.city, city))
        .map(|a| a.travel_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Availability, AvailabilityType, Role, User};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    fn area(city: &str, neighborhood: Option<&str>, postal: Option<&str>, fee: i64) -> ServiceArea {
        ServiceArea {
            id: uuid::Uuid::new_v4().to_string(),
            cleaner_profile_id: "p1".to_string(),
            city: city.to_string(),
            neighborhood: neighborhood.map(String::from),
            postal_code: postal.map(String::from),
            travel_fee: fee,
            is_preferred: false,
            created_at: db::now(),
        }
    }

    fn seed_cleaner(conn: &Connection, id: &str, rating: f64) -> CleanerProfile {
        let now = db::now();
        queries::create_user(
            conn,
            &User {
                id: format!("user-{id}"),
                email: format!("{id}@example.com"),
                first_name: "Ioana".to_string(),
                last_name: "Marin".to_string(),
                phone: None,
                role: Role::Cleaner,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        let mut profile = CleanerProfile::new_for_user(&format!("user-{id}"), None, now);
        profile.id = id.to_string();
        profile.average_rating = rating;
        queries::create_cleaner_profile(conn, &profile).unwrap();
        profile
    }

    fn block(conn: &Connection, profile_id: &str, day: &str, start: &str, end: &str, weekly: bool) {
        queries::create_availability(
            conn,
            &Availability {
                id: uuid::Uuid::new_v4().to_string(),
                cleaner_profile_id: profile_id.to_string(),
                kind: AvailabilityType::Unavailable,
                date: date(day),
                start_time: start.to_string(),
                end_time: end.to_string(),
                recurring_weekly: weekly,
                recurrence_end_date: None,
                notes: None,
                created_at: db::now(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_unavailability_overlap_cases() {
        let conn = setup_db();
        seed_cleaner(&conn, "p1", 4.5);
        block(&conn, "p1", "2025-06-16", "09:00", "12:00", false);

        let d = date("2025-06-16");
        assert!(!is_cleaner_available(&conn, "p1", d, &window("11:00", "13:00")).unwrap());
        assert!(is_cleaner_available(&conn, "p1", d, &window("12:00", "14:00")).unwrap());
        assert!(is_cleaner_available(&conn, "p1", date("2025-06-17"), &window("09:00", "12:00")).unwrap());
    }

    #[test]
    fn test_weekly_unavailability_repeats() {
        let conn = setup_db();
        seed_cleaner(&conn, "p1", 4.5);
        // Mondays
        block(&conn, "p1", "2025-06-16", "08:00", "10:00", true);

        let w = window("09:00", "11:00");
        assert!(!is_cleaner_available(&conn, "p1", date("2025-06-23"), &w).unwrap());
        assert!(is_cleaner_available(&conn, "p1", date("2025-06-24"), &w).unwrap());
        assert!(is_cleaner_available(&conn, "p1", date("2025-06-09"), &w).unwrap());
    }

    #[test]
    fn test_available_cleaners_ordered_by_rating() {
        let conn = setup_db();
        seed_cleaner(&conn, "low", 3.0);
        seed_cleaner(&conn, "high", 4.9);
        seed_cleaner(&conn, "busy", 5.0);
        block(&conn, "busy", "2025-06-16", "00:00", "23:59", false);

        let found = find_available_cleaners(&conn, date("2025-06-16"), &window("10:00", "12:00"), &[]).unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[test]
    fn test_available_cleaners_restricted_to_areas() {
        let conn = setup_db();
        seed_cleaner(&conn, "p1", 4.0);
        seed_cleaner(&conn, "p2", 4.0);
        let mut a = area("Cluj-Napoca", None, None, 0);
        a.cleaner_profile_id = "p2".to_string();
        queries::create_service_area(&conn, &a).unwrap();

        let found =
            find_available_cleaners(&conn, date("2025-06-16"), &window("10:00", "12:00"), &[a.id.clone()]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p2");
    }

    #[test]
    fn test_area_search_deduplicates_and_skips_inactive() {
        let conn = setup_db();
        seed_cleaner(&conn, "p1", 4.0);
        seed_cleaner(&conn, "p2", 4.0);
        for (profile, hood) in [("p1", Some("Zorilor")), ("p1", Some("Gheorgheni")), ("p2", None)] {
            let mut a = area("Cluj-Napoca", hood, None, 1000);
            a.cleaner_profile_id = profile.to_string();
            queries::create_service_area(&conn, &a).unwrap();
        }
        conn.execute("UPDATE cleaner_profiles SET is_active = 0 WHERE id = 'p2'", [])
            .unwrap();

        let found = find_cleaners_in_area(&conn, "cluj-napoca", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p1");

        let found = find_cleaners_in_area(&conn, "Cluj-Napoca", Some("zorilor")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_travel_fee_most_specific_wins() {
        let areas = vec![
            area("Cluj-Napoca", None, None, 1000),
            area("Cluj-Napoca", Some("Zorilor"), None, 1500),
            area("Cluj-Napoca", None, Some("400394"), 2000),
        ];

        assert_eq!(resolve_travel_fee(&areas, "Cluj-Napoca", Some("Zorilor"), Some("400394")), Some(2000));
        assert_eq!(resolve_travel_fee(&areas, "cluj-napoca ", Some("zorilor"), Some("400001")), Some(1500));
        assert_eq!(resolve_travel_fee(&areas, "Cluj-Napoca", Some("Manastur"), None), Some(1000));
        assert_eq!(resolve_travel_fee(&areas, "Bucuresti", None, None), None);
    }

    #[test]
    fn test_travel_fee_independent_of_declaration_order() {
        let mut areas = vec![
            area("Cluj-Napoca", Some("Zorilor"), None, 1500),
            area("Cluj-Napoca", None, None, 1000),
            area("Cluj-Napoca", None, None, 900),
        ];
        assert_eq!(resolve_travel_fee(&areas, "Cluj-Napoca", Some("Zorilor"), None), Some(1500));
        areas.reverse();
        assert_eq!(resolve_travel_fee(&areas, "Cluj-Napoca", Some("Zorilor"), None), Some(1500));
    }
}
