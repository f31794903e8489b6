use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{format_date, format_ts, parse_date, parse_enum, parse_json, parse_opt_ts, parse_ts};
use crate::models::{
    Address, Application, ApplicationDocuments, ApplicationStatus, ApplicationType, Availability,
    AvailabilityType, Booking, BookingStatus, CleanerInvite, CleanerProfile, Company, CompanyInfo,
    CompanyType, Frequency, InviteStatus, Review, ReviewStatus, Role, ServiceAddOn,
    ServiceAddOnDefinition, ServiceArea, ServiceDefinition, ServiceType, Tier, Transaction,
    TransactionStatus, User,
};

type Params = Vec<Box<dyn rusqlite::types::ToSql>>;

// ── Users ──

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, role, created_at, updated_at";

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        role: parse_enum(5, &row.get::<_, String>(5)?, Role::parse)?,
        created_at: parse_ts(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_ts(7, &row.get::<_, String>(7)?)?,
    })
}

pub fn create_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, first_name, last_name, phone, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.email,
            user.first_name,
            user.last_name,
            user.phone,
            user.role.as_str(),
            format_ts(&user.created_at),
            format_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        parse_user_row,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
        params![email.trim()],
        parse_user_row,
    )
    .optional()
}

/// Changes the role only if it still is `expected`.
pub fn update_user_role_if(
    conn: &Connection,
    id: &str,
    expected: Role,
    role: Role,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET role = ?1, updated_at = datetime('now') WHERE id = ?2 AND role = ?3",
        params![role.as_str(), id, expected.as_str()],
    )?;
    Ok(count > 0)
}

// ── Companies ──

const COMPANY_COLUMNS: &str = "id, name, company_type, registration_number, admin_user_id, \
     total_cleaners, active_cleaners, created_at, updated_at";

fn parse_company_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        company_type: parse_enum(2, &row.get::<_, String>(2)?, CompanyType::parse)?,
        registration_number: row.get(3)?,
        admin_user_id: row.get(4)?,
        total_cleaners: row.get(5)?,
        active_cleaners: row.get(6)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}

pub fn create_company(conn: &Connection, company: &Company) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO companies (id, name, company_type, registration_number, admin_user_id, total_cleaners, active_cleaners, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            company.id,
            company.name,
            company.company_type.as_str(),
            company.registration_number,
            company.admin_user_id,
            company.total_cleaners,
            company.active_cleaners,
            format_ts(&company.created_at),
            format_ts(&company.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_company(conn: &Connection, id: &str) -> rusqlite::Result<Option<Company>> {
    conn.query_row(
        &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
        params![id],
        parse_company_row,
    )
    .optional()
}

pub fn get_company_for_admin(conn: &Connection, admin_user_id: &str) -> rusqlite::Result<Option<Company>> {
    conn.query_row(
        &format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE admin_user_id = ?1 ORDER BY created_at ASC LIMIT 1"
        ),
        params![admin_user_id],
        parse_company_row,
    )
    .optional()
}

/// Moves both cleaner counters by `delta` in a single statement.
pub fn adjust_company_cleaners(conn: &Connection, id: &str, delta: i64) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE companies SET
           total_cleaners = MAX(total_cleaners + ?1, 0),
           active_cleaners = MAX(active_cleaners + ?1, 0),
           updated_at = datetime('now')
         WHERE id = ?2",
        params![delta, id],
    )?;
    Ok(count > 0)
}

// ── Cleaner Profiles ──

const PROFILE_COLUMNS: &str = "p.id, p.user_id, p.company_id, p.tier, p.hourly_rate, p.bio, p.is_active, \
     p.total_bookings, p.completed_bookings, p.average_rating, p.total_reviews, p.created_at, p.updated_at";

fn parse_profile_row(row: &Row) -> rusqlite::Result<CleanerProfile> {
    Ok(CleanerProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        company_id: row.get(2)?,
        tier: parse_enum(3, &row.get::<_, String>(3)?, Tier::parse)?,
        hourly_rate: row.get(4)?,
        bio: row.get(5)?,
        is_active: row.get(6)?,
        total_bookings: row.get(7)?,
        completed_bookings: row.get(8)?,
        average_rating: row.get(9)?,
        total_reviews: row.get(10)?,
        created_at: parse_ts(11, &row.get::<_, String>(11)?)?,
        updated_at: parse_ts(12, &row.get::<_, String>(12)?)?,
    })
}

fn collect_profiles(conn: &Connection, sql: &str, params: &[&dyn rusqlite::types::ToSql]) -> rusqlite::Result<Vec<CleanerProfile>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, parse_profile_row)?;
    rows.collect()
}

pub fn create_cleaner_profile(conn: &Connection, profile: &CleanerProfile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cleaner_profiles (id, user_id, company_id, tier, hourly_rate, bio, is_active, total_bookings, completed_bookings, average_rating, total_reviews, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            profile.id,
            profile.user_id,
            profile.company_id,
            profile.tier.as_str(),
            profile.hourly_rate,
            profile.bio,
            profile.is_active,
            profile.total_bookings,
            profile.completed_bookings,
            profile.average_rating,
            profile.total_reviews,
            format_ts(&profile.created_at),
            format_ts(&profile.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_cleaner_profile(conn: &Connection, id: &str) -> rusqlite::Result<Option<CleanerProfile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p WHERE p.id = ?1"),
        params![id],
        parse_profile_row,
    )
    .optional()
}

pub fn get_cleaner_profile_by_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<CleanerProfile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p WHERE p.user_id = ?1"),
        params![user_id],
        parse_profile_row,
    )
    .optional()
}

pub fn update_cleaner_rate(
    conn: &Connection,
    id: &str,
    hourly_rate: i64,
    bio: Option<&str>,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cleaner_profiles SET hourly_rate = ?1, bio = COALESCE(?2, bio), updated_at = datetime('now') WHERE id = ?3",
        params![hourly_rate, bio, id],
    )?;
    Ok(count > 0)
}

pub fn update_cleaner_tier(conn: &Connection, id: &str, tier: Tier, hourly_rate: i64) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cleaner_profiles SET tier = ?1, hourly_rate = ?2, updated_at = datetime('now') WHERE id = ?3",
        params![tier.as_str(), hourly_rate, id],
    )?;
    Ok(count > 0)
}

pub fn detach_cleaner_from_company(conn: &Connection, profile_id: &str, company_id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cleaner_profiles SET company_id = NULL, updated_at = datetime('now') WHERE id = ?1 AND company_id = ?2",
        params![profile_id, company_id],
    )?;
    Ok(count > 0)
}

pub fn increment_cleaner_total_bookings(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cleaner_profiles SET total_bookings = total_bookings + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn increment_cleaner_completed_bookings(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cleaner_profiles SET completed_bookings = completed_bookings + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

/// Recomputes rating aggregates from reviews that were not rejected.
pub fn refresh_cleaner_rating(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cleaner_profiles SET
           average_rating = COALESCE((SELECT AVG(rating) FROM reviews WHERE cleaner_profile_id = ?1 AND status != 'rejected'), 0),
           total_reviews = (SELECT COUNT(*) FROM reviews WHERE cleaner_profile_id = ?1 AND status != 'rejected'),
           updated_at = datetime('now')
         WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn list_active_cleaner_profiles(conn: &Connection) -> rusqlite::Result<Vec<CleanerProfile>> {
    collect_profiles(
        conn,
        &format!(
            "SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p WHERE p.is_active = 1
             ORDER BY p.average_rating DESC, p.created_at ASC"
        ),
        &[],
    )
}

/// Active profiles owning at least one of the given service areas.
pub fn list_profiles_for_areas(conn: &Connection, area_ids: &[String]) -> rusqlite::Result<Vec<CleanerProfile>> {
    if area_ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = (1..=area_ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p
         WHERE p.is_active = 1
           AND p.id IN (SELECT cleaner_profile_id FROM service_areas WHERE id IN ({placeholders}))
         ORDER BY p.average_rating DESC, p.created_at ASC"
    );
    let params: Vec<&dyn rusqlite::types::ToSql> =
        area_ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
    collect_profiles(conn, &sql, &params)
}

pub fn find_profiles_in_area(
    conn: &Connection,
    city: &str,
    neighborhood: Option<&str>,
) -> rusqlite::Result<Vec<CleanerProfile>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p
         WHERE p.is_active = 1
           AND EXISTS (
             SELECT 1 FROM service_areas a
             WHERE a.cleaner_profile_id = p.id
               AND a.city = ?1 COLLATE NOCASE
               AND (?2 IS NULL OR a.neighborhood = ?2 COLLATE NOCASE)
           )
         ORDER BY p.average_rating DESC, p.created_at ASC"
    );
    collect_profiles(conn, &sql, params![city.trim(), neighborhood.map(str::trim)])
}

pub fn find_profiles_by_postal_code(conn: &Connection, postal_code: &str) -> rusqlite::Result<Vec<CleanerProfile>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM cleaner_profiles p
         WHERE p.is_active = 1
           AND EXISTS (
             SELECT 1 FROM service_areas a
             WHERE a.cleaner_profile_id = p.id AND a.postal_code = ?1
           )
         ORDER BY p.average_rating DESC, p.created_at ASC"
    );
    collect_profiles(conn, &sql, params![postal_code.trim()])
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyCleaner {
    pub profile: CleanerProfile,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub fn list_company_cleaners(conn: &Connection, company_id: &str) -> rusqlite::Result<Vec<CompanyCleaner>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS}, u.email, u.first_name, u.last_name
         FROM cleaner_profiles p JOIN users u ON u.id = p.user_id
         WHERE p.company_id = ?1
         ORDER BY u.last_name ASC, u.first_name ASC"
    ))?;
    let rows = stmt.query_map(params![company_id], |row| {
        Ok(CompanyCleaner {
            profile: parse_profile_row(row)?,
            email: row.get(13)?,
            first_name: row.get(14)?,
            last_name: row.get(15)?,
        })
    })?;
    rows.collect()
}

// ── Service Areas ──

const AREA_COLUMNS: &str =
    "id, cleaner_profile_id, city, neighborhood, postal_code, travel_fee, is_preferred, created_at";

fn parse_area_row(row: &Row) -> rusqlite::Result<ServiceArea> {
    Ok(ServiceArea {
        id: row.get(0)?,
        cleaner_profile_id: row.get(1)?,
        city: row.get(2)?,
        neighborhood: row.get(3)?,
        postal_code: row.get(4)?,
        travel_fee: row.get(5)?,
        is_preferred: row.get(6)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
    })
}

pub fn create_service_area(conn: &Connection, area: &ServiceArea) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO service_areas (id, cleaner_profile_id, city, neighborhood, postal_code, travel_fee, is_preferred, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            area.id,
            area.cleaner_profile_id,
            area.city,
            area.neighborhood,
            area.postal_code,
            area.travel_fee,
            area.is_preferred,
            format_ts(&area.created_at),
        ],
    )?;
    Ok(())
}

pub fn list_service_areas(conn: &Connection, cleaner_profile_id: &str) -> rusqlite::Result<Vec<ServiceArea>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AREA_COLUMNS} FROM service_areas WHERE cleaner_profile_id = ?1
         ORDER BY is_preferred DESC, created_at ASC"
    ))?;
    let rows = stmt.query_map(params![cleaner_profile_id], parse_area_row)?;
    rows.collect()
}

pub fn delete_service_area(conn: &Connection, id: &str, cleaner_profile_id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "DELETE FROM service_areas WHERE id = ?1 AND cleaner_profile_id = ?2",
        params![id, cleaner_profile_id],
    )?;
    Ok(count > 0)
}

// ── Availability ──

const AVAILABILITY_COLUMNS: &str = "id, cleaner_profile_id, kind, date, start_time, end_time, \
     recurring_weekly, recurrence_end_date, notes, created_at";

fn parse_availability_row(row: &Row) -> rusqlite::Result<Availability> {
    let recurrence_end: Option<String> = row.get(7)?;
    Ok(Availability {
        id: row.get(0)?,
        cleaner_profile_id: row.get(1)?,
        kind: parse_enum(2, &row.get::<_, String>(2)?, AvailabilityType::parse)?,
        date: parse_date(3, &row.get::<_, String>(3)?)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        recurring_weekly: row.get(6)?,
        recurrence_end_date: recurrence_end.map(|d| parse_date(7, &d)).transpose()?,
        notes: row.get(8)?,
        created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
    })
}

pub fn create_availability(conn: &Connection, entry: &Availability) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO availability (id, cleaner_profile_id, kind, date, start_time, end_time, recurring_weekly, recurrence_end_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.id,
            entry.cleaner_profile_id,
            entry.kind.as_str(),
            format_date(&entry.date),
            entry.start_time,
            entry.end_time,
            entry.recurring_weekly,
            entry.recurrence_end_date.as_ref().map(format_date),
            entry.notes,
            format_ts(&entry.created_at),
        ],
    )?;
    Ok(())
}

pub fn list_availability(conn: &Connection, cleaner_profile_id: &str) -> rusqlite::Result<Vec<Availability>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AVAILABILITY_COLUMNS} FROM availability WHERE cleaner_profile_id = ?1
         ORDER BY date ASC, start_time ASC"
    ))?;
    let rows = stmt.query_map(params![cleaner_profile_id], parse_availability_row)?;
    rows.collect()
}

/// Unavailable entries that could cover `date`: the exact date plus any
/// weekly entry that started on or before it.
pub fn list_unavailability_covering(
    conn: &Connection,
    cleaner_profile_id: &str,
    date: &NaiveDate,
) -> rusqlite::Result<Vec<Availability>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AVAILABILITY_COLUMNS} FROM availability
         WHERE cleaner_profile_id = ?1 AND kind = 'unavailable'
           AND (date = ?2 OR (recurring_weekly = 1 AND date <= ?2))"
    ))?;
    let rows = stmt.query_map(params![cleaner_profile_id, format_date(date)], parse_availability_row)?;
    rows.collect()
}

pub fn delete_availability(conn: &Connection, id: &str, cleaner_profile_id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "DELETE FROM availability WHERE id = ?1 AND cleaner_profile_id = ?2",
        params![id, cleaner_profile_id],
    )?;
    Ok(count > 0)
}

// ── Service Catalog ──

fn parse_service_row(row: &Row) -> rusqlite::Result<ServiceDefinition> {
    Ok(ServiceDefinition {
        service_type: parse_enum(0, &row.get::<_, String>(0)?, ServiceType::parse)?,
        name: row.get(1)?,
        description: row.get(2)?,
        base_hours: row.get(3)?,
        price_multiplier: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn parse_add_on_row(row: &Row) -> rusqlite::Result<ServiceAddOnDefinition> {
    Ok(ServiceAddOnDefinition {
        add_on: parse_enum(0, &row.get::<_, String>(0)?, ServiceAddOn::parse)?,
        name: row.get(1)?,
        fixed_price: row.get(2)?,
        estimated_hours: row.get(3)?,
        is_active: row.get(4)?,
    })
}

pub fn get_service_definition(
    conn: &Connection,
    service_type: ServiceType,
) -> rusqlite::Result<Option<ServiceDefinition>> {
    conn.query_row(
        "SELECT service_type, name, description, base_hours, price_multiplier, is_active
         FROM service_definitions WHERE service_type = ?1",
        params![service_type.as_str()],
        parse_service_row,
    )
    .optional()
}

pub fn list_service_definitions(conn: &Connection) -> rusqlite::Result<Vec<ServiceDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT service_type, name, description, base_hours, price_multiplier, is_active
         FROM service_definitions ORDER BY base_hours ASC, service_type ASC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;
    rows.collect()
}

pub fn upsert_service_definition(conn: &Connection, def: &ServiceDefinition) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO service_definitions (service_type, name, description, base_hours, price_multiplier, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(service_type) DO UPDATE SET
           name = excluded.name,
           description = excluded.description,
           base_hours = excluded.base_hours,
           price_multiplier = excluded.price_multiplier,
           is_active = excluded.is_active,
           updated_at = datetime('now')",
        params![
            def.service_type.as_str(),
            def.name,
            def.description,
            def.base_hours,
            def.price_multiplier,
            def.is_active,
        ],
    )?;
    Ok(())
}

pub fn list_add_on_definitions(conn: &Connection) -> rusqlite::Result<Vec<ServiceAddOnDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT add_on, name, fixed_price, estimated_hours, is_active
         FROM service_add_on_definitions ORDER BY add_on ASC",
    )?;
    let rows = stmt.query_map([], parse_add_on_row)?;
    rows.collect()
}

pub fn upsert_add_on_definition(conn: &Connection, def: &ServiceAddOnDefinition) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO service_add_on_definitions (add_on, name, fixed_price, estimated_hours, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(add_on) DO UPDATE SET
           name = excluded.name,
           fixed_price = excluded.fixed_price,
           estimated_hours = excluded.estimated_hours,
           is_active = excluded.is_active,
           updated_at = datetime('now')",
        params![
            def.add_on.as_str(),
            def.name,
            def.fixed_price,
            def.estimated_hours,
            def.is_active,
        ],
    )?;
    Ok(())
}

// ── Addresses ──

const ADDRESS_COLUMNS: &str = "id, user_id, street, city, neighborhood, postal_code, is_default, created_at";

fn parse_address_row(row: &Row) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get(0)?,
        user_id: row.get(1)?,
        street: row.get(2)?,
        city: row.get(3)?,
        neighborhood: row.get(4)?,
        postal_code: row.get(5)?,
        is_default: row.get(6)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
    })
}

pub fn create_address(conn: &Connection, address: &Address) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO addresses (id, user_id, street, city, neighborhood, postal_code, is_default, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            address.id,
            address.user_id,
            address.street,
            address.city,
            address.neighborhood,
            address.postal_code,
            address.is_default,
            format_ts(&address.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_address(conn: &Connection, id: &str) -> rusqlite::Result<Option<Address>> {
    conn.query_row(
        &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1"),
        params![id],
        parse_address_row,
    )
    .optional()
}

pub fn list_addresses(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Address>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = ?1 ORDER BY is_default DESC, created_at ASC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_address_row)?;
    rows.collect()
}

/// Clears the user's current default and sets the new one in a single
/// transaction. Returns false (and changes nothing) if the address is not
/// the user's.
pub fn set_default_address(conn: &mut Connection, user_id: &str, address_id: &str) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE addresses SET is_default = 0 WHERE user_id = ?1 AND is_default = 1",
        params![user_id],
    )?;
    let count = tx.execute(
        "UPDATE addresses SET is_default = 1 WHERE id = ?1 AND user_id = ?2",
        params![address_id, user_id],
    )?;
    if count == 0 {
        // dropping the transaction rolls back the cleared default
        return Ok(false);
    }
    tx.commit()?;
    Ok(true)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, customer_id, cleaner_id, cleaner_profile_id, address_id, service_type, \
     frequency, add_ons, scheduled_date, scheduled_time, duration_minutes, cleaner_hourly_rate, \
     service_price, add_ons_price, travel_fee, platform_fee, total_price, cleaner_payout, status, \
     customer_notes, cleaner_notes, cancellation_reason, cancellation_note, cancelled_by, \
     parent_booking_id, next_booking_id, confirmed_at, started_at, completed_at, cancelled_at, \
     created_at, updated_at";

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        cleaner_id: row.get(2)?,
        cleaner_profile_id: row.get(3)?,
        address_id: row.get(4)?,
        service_type: parse_enum(5, &row.get::<_, String>(5)?, ServiceType::parse)?,
        frequency: parse_enum(6, &row.get::<_, String>(6)?, Frequency::parse)?,
        add_ons: parse_json(7, &row.get::<_, String>(7)?)?,
        scheduled_date: parse_date(8, &row.get::<_, String>(8)?)?,
        scheduled_time: row.get(9)?,
        duration_minutes: row.get(10)?,
        cleaner_hourly_rate: row.get(11)?,
        service_price: row.get(12)?,
        add_ons_price: row.get(13)?,
        travel_fee: row.get(14)?,
        platform_fee: row.get(15)?,
        total_price: row.get(16)?,
        cleaner_payout: row.get(17)?,
        status: parse_enum(18, &row.get::<_, String>(18)?, BookingStatus::parse)?,
        customer_notes: row.get(19)?,
        cleaner_notes: row.get(20)?,
        cancellation_reason: row.get(21)?,
        cancellation_note: row.get(22)?,
        cancelled_by: row.get(23)?,
        parent_booking_id: row.get(24)?,
        next_booking_id: row.get(25)?,
        confirmed_at: parse_opt_ts(26, row.get(26)?)?,
        started_at: parse_opt_ts(27, row.get(27)?)?,
        completed_at: parse_opt_ts(28, row.get(28)?)?,
        cancelled_at: parse_opt_ts(29, row.get(29)?)?,
        created_at: parse_ts(30, &row.get::<_, String>(30)?)?,
        updated_at: parse_ts(31, &row.get::<_, String>(31)?)?,
    })
}

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let add_ons = serde_json::to_string(&booking.add_ons)?;
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32)"
        ),
        params![
            booking.id,
            booking.customer_id,
            booking.cleaner_id,
            booking.cleaner_profile_id,
            booking.address_id,
            booking.service_type.as_str(),
            booking.frequency.as_str(),
            add_ons,
            format_date(&booking.scheduled_date),
            booking.scheduled_time,
            booking.duration_minutes,
            booking.cleaner_hourly_rate,
            booking.service_price,
            booking.add_ons_price,
            booking.travel_fee,
            booking.platform_fee,
            booking.total_price,
            booking.cleaner_payout,
            booking.status.as_str(),
            booking.customer_notes,
            booking.cleaner_notes,
            booking.cancellation_reason,
            booking.cancellation_note,
            booking.cancelled_by,
            booking.parent_booking_id,
            booking.next_booking_id,
            booking.confirmed_at.as_ref().map(format_ts),
            booking.started_at.as_ref().map(format_ts),
            booking.completed_at.as_ref().map(format_ts),
            booking.cancelled_at.as_ref().map(format_ts),
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn list_bookings_where(
    conn: &Connection,
    owner_column: &str,
    owner_id: &str,
    filter: &BookingFilter,
) -> rusqlite::Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {owner_column} = ?1");
    let mut params_vec: Params = vec![Box::new(owner_id.to_string())];

    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
    }
    if let Some(from) = filter.from_date {
        params_vec.push(Box::new(format_date(&from)));
        sql.push_str(&format!(" AND scheduled_date >= ?{}", params_vec.len()));
    }
    if let Some(to) = filter.to_date {
        params_vec.push(Box::new(format_date(&to)));
        sql.push_str(&format!(" AND scheduled_date <= ?{}", params_vec.len()));
    }

    params_vec.push(Box::new(filter.limit.unwrap_or(50).clamp(1, 200)));
    sql.push_str(&format!(
        " ORDER BY scheduled_date DESC, scheduled_time DESC LIMIT ?{}",
        params_vec.len()
    ));
    params_vec.push(Box::new(filter.offset.unwrap_or(0).max(0)));
    sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), parse_booking_row)?;
    rows.collect()
}

pub fn list_customer_bookings(
    conn: &Connection,
    customer_id: &str,
    filter: &BookingFilter,
) -> rusqlite::Result<Vec<Booking>> {
    list_bookings_where(conn, "customer_id", customer_id, filter)
}

pub fn list_cleaner_jobs(
    conn: &Connection,
    cleaner_profile_id: &str,
    filter: &BookingFilter,
) -> rusqlite::Result<Vec<Booking>> {
    list_bookings_where(conn, "cleaner_profile_id", cleaner_profile_id, filter)
}

/// Open bookings on or after `from` where the user is either side.
pub fn list_upcoming_bookings(
    conn: &Connection,
    user_id: &str,
    from: &NaiveDate,
    limit: i64,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (customer_id = ?1 OR cleaner_id = ?1)
           AND scheduled_date >= ?2
           AND status IN ('pending', 'confirmed')
         ORDER BY scheduled_date ASC, scheduled_time ASC
         LIMIT ?3"
    ))?;
    let rows = stmt.query_map(params![user_id, format_date(from), limit], parse_booking_row)?;
    rows.collect()
}

/// Confirmed and in-progress bookings of a cleaner on a date.
pub fn list_schedule_blocking_bookings(
    conn: &Connection,
    cleaner_profile_id: &str,
    date: &NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE cleaner_profile_id = ?1 AND scheduled_date = ?2
           AND status IN ('confirmed', 'in_progress')
         ORDER BY scheduled_time ASC"
    ))?;
    let rows = stmt.query_map(params![cleaner_profile_id, format_date(date)], parse_booking_row)?;
    rows.collect()
}

/// Moves a booking from `from` to `to`, stamping the lifecycle timestamp
/// that belongs to `to`. Returns false when the booking is no longer in
/// `from`.
pub fn transition_booking_status(
    conn: &Connection,
    id: &str,
    from: BookingStatus,
    to: BookingStatus,
    at: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let stamp = match to {
        BookingStatus::Confirmed => ", confirmed_at = ?1",
        BookingStatus::InProgress => ", started_at = ?1",
        BookingStatus::Completed => ", completed_at = ?1",
        BookingStatus::Cancelled => ", cancelled_at = ?1",
        BookingStatus::Pending | BookingStatus::NoShow => "",
    };
    let sql = format!(
        "UPDATE bookings SET status = ?2, updated_at = ?1{stamp} WHERE id = ?3 AND status = ?4"
    );
    let count = conn.execute(&sql, params![format_ts(at), to.as_str(), id, from.as_str()])?;
    Ok(count > 0)
}

pub fn set_booking_cleaner_notes(conn: &Connection, id: &str, notes: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE bookings SET cleaner_notes = ?1 WHERE id = ?2",
        params![notes, id],
    )?;
    Ok(())
}

pub fn record_booking_cancellation(
    conn: &Connection,
    id: &str,
    reason: &str,
    note: Option<&str>,
    cancelled_by: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE bookings SET cancellation_reason = ?1, cancellation_note = ?2, cancelled_by = ?3 WHERE id = ?4",
        params![reason, note, cancelled_by, id],
    )?;
    Ok(())
}

/// Reschedules or re-notes a booking that is still pending.
pub fn update_pending_booking(
    conn: &Connection,
    id: &str,
    date: &NaiveDate,
    time: &str,
    notes: Option<&str>,
    at: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET scheduled_date = ?1, scheduled_time = ?2, customer_notes = ?3, updated_at = ?4
         WHERE id = ?5 AND status = 'pending'",
        params![format_date(date), time, notes, format_ts(at), id],
    )?;
    Ok(count > 0)
}

// ── Reviews ──

const REVIEW_COLUMNS: &str = "id, booking_id, customer_id, cleaner_profile_id, rating, quality_rating, \
     punctuality_rating, communication_rating, comment, status, created_at";

fn parse_review_row(row: &Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer_id: row.get(2)?,
        cleaner_profile_id: row.get(3)?,
        rating: row.get(4)?,
        quality_rating: row.get(5)?,
        punctuality_rating: row.get(6)?,
        communication_rating: row.get(7)?,
        comment: row.get(8)?,
        status: parse_enum(9, &row.get::<_, String>(9)?, ReviewStatus::parse)?,
        created_at: parse_ts(10, &row.get::<_, String>(10)?)?,
    })
}

pub fn create_review(conn: &Connection, review: &Review) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
        params![
            review.id,
            review.booking_id,
            review.customer_id,
            review.cleaner_profile_id,
            review.rating,
            review.quality_rating,
            review.punctuality_rating,
            review.communication_rating,
            review.comment,
            review.status.as_str(),
            format_ts(&review.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_review_for_booking(conn: &Connection, booking_id: &str) -> rusqlite::Result<Option<Review>> {
    conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE booking_id = ?1"),
        params![booking_id],
        parse_review_row,
    )
    .optional()
}

// ── Transactions ──

pub fn create_transaction(conn: &Connection, txn: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO transactions (id, booking_id, amount, platform_fee, cleaner_payout, status, provider_reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            txn.id,
            txn.booking_id,
            txn.amount,
            txn.platform_fee,
            txn.cleaner_payout,
            txn.status.as_str(),
            txn.provider_reference,
            format_ts(&txn.created_at),
        ],
    )?;
    Ok(())
}

pub fn list_transactions_for_booking(conn: &Connection, booking_id: &str) -> rusqlite::Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, amount, platform_fee, cleaner_payout, status, provider_reference, created_at
         FROM transactions WHERE booking_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok(Transaction {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            amount: row.get(2)?,
            platform_fee: row.get(3)?,
            cleaner_payout: row.get(4)?,
            status: parse_enum(5, &row.get::<_, String>(5)?, TransactionStatus::parse)?,
            provider_reference: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        })
    })?;
    rows.collect()
}

// ── Applications ──

const APPLICATION_COLUMNS: &str = "id, user_id, application_type, status, company_name, company_type, \
     registration_number, identity_document_url, business_registration_url, insurance_document_url, \
     additional_documents, message, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at";

fn parse_application_row(row: &Row) -> rusqlite::Result<Application> {
    let company_name: Option<String> = row.get(4)?;
    let company_type: Option<String> = row.get(5)?;
    let company = match (company_name, company_type) {
        (Some(name), Some(kind)) => Some(CompanyInfo {
            name,
            company_type: parse_enum(5, &kind, CompanyType::parse)?,
            registration_number: row.get(6)?,
        }),
        _ => None,
    };

    Ok(Application {
        id: row.get(0)?,
        user_id: row.get(1)?,
        application_type: parse_enum(2, &row.get::<_, String>(2)?, ApplicationType::parse)?,
        status: parse_enum(3, &row.get::<_, String>(3)?, ApplicationStatus::parse)?,
        company,
        documents: ApplicationDocuments {
            identity_document_url: row.get(7)?,
            business_registration_url: row.get(8)?,
            insurance_document_url: row.get(9)?,
            additional_documents: parse_json(10, &row.get::<_, String>(10)?)?,
        },
        message: row.get(11)?,
        reviewed_by: row.get(12)?,
        reviewed_at: parse_opt_ts(13, row.get(13)?)?,
        rejection_reason: row.get(14)?,
        created_at: parse_ts(15, &row.get::<_, String>(15)?)?,
        updated_at: parse_ts(16, &row.get::<_, String>(16)?)?,
    })
}

pub fn create_application(conn: &Connection, app: &Application) -> anyhow::Result<()> {
    let additional = serde_json::to_string(&app.documents.additional_documents)?;
    conn.execute(
        &format!(
            "INSERT INTO applications ({APPLICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            app.id,
            app.user_id,
            app.application_type.as_str(),
            app.status.as_str(),
            app.company.as_ref().map(|c| c.name.as_str()),
            app.company.as_ref().map(|c| c.company_type.as_str()),
            app.company.as_ref().and_then(|c| c.registration_number.as_deref()),
            app.documents.identity_document_url,
            app.documents.business_registration_url,
            app.documents.insurance_document_url,
            additional,
            app.message,
            app.reviewed_by,
            app.reviewed_at.as_ref().map(format_ts),
            app.rejection_reason,
            format_ts(&app.created_at),
            format_ts(&app.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_application(conn: &Connection, id: &str) -> rusqlite::Result<Option<Application>> {
    conn.query_row(
        &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
        params![id],
        parse_application_row,
    )
    .optional()
}

pub fn list_user_applications(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Application>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_application_row)?;
    rows.collect()
}

pub fn list_pending_applications(conn: &Connection) -> rusqlite::Result<Vec<Application>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE status = 'pending' ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map([], parse_application_row)?;
    rows.collect()
}

pub fn has_pending_application(
    conn: &Connection,
    user_id: &str,
    application_type: ApplicationType,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM applications WHERE user_id = ?1 AND application_type = ?2 AND status = 'pending'",
        params![user_id, application_type.as_str()],
        |row| row.get(0),
    )
}

/// Resolves a still-pending application. Returns false if it was already
/// resolved.
pub fn resolve_application(
    conn: &Connection,
    id: &str,
    status: ApplicationStatus,
    reviewer_id: &str,
    rejection_reason: Option<&str>,
    at: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let ts = format_ts(at);
    let count = conn.execute(
        "UPDATE applications SET status = ?1, reviewed_by = ?2, reviewed_at = ?3, rejection_reason = ?4, updated_at = ?3
         WHERE id = ?5 AND status = 'pending'",
        params![status.as_str(), reviewer_id, ts, rejection_reason, id],
    )?;
    Ok(count > 0)
}

// ── Cleaner Invites ──

const INVITE_COLUMNS: &str =
    "id, company_id, invited_by, email, token, status, expires_at, accepted_by, accepted_at, created_at";

fn parse_invite_row(row: &Row) -> rusqlite::Result<CleanerInvite> {
    Ok(CleanerInvite {
        id: row.get(0)?,
        company_id: row.get(1)?,
        invited_by: row.get(2)?,
        email: row.get(3)?,
        token: row.get(4)?,
        status: parse_enum(5, &row.get::<_, String>(5)?, InviteStatus::parse)?,
        expires_at: parse_ts(6, &row.get::<_, String>(6)?)?,
        accepted_by: row.get(7)?,
        accepted_at: parse_opt_ts(8, row.get(8)?)?,
        created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
    })
}

pub fn create_invite(conn: &Connection, invite: &CleanerInvite) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT INTO cleaner_invites ({INVITE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            invite.id,
            invite.company_id,
            invite.invited_by,
            invite.email,
            invite.token,
            invite.status.as_str(),
            format_ts(&invite.expires_at),
            invite.accepted_by,
            invite.accepted_at.as_ref().map(format_ts),
            format_ts(&invite.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_invite(conn: &Connection, id: &str) -> rusqlite::Result<Option<CleanerInvite>> {
    conn.query_row(
        &format!("SELECT {INVITE_COLUMNS} FROM cleaner_invites WHERE id = ?1"),
        params![id],
        parse_invite_row,
    )
    .optional()
}

pub fn get_invite_by_token(conn: &Connection, token: &str) -> rusqlite::Result<Option<CleanerInvite>> {
    conn.query_row(
        &format!("SELECT {INVITE_COLUMNS} FROM cleaner_invites WHERE token = ?1"),
        params![token],
        parse_invite_row,
    )
    .optional()
}

pub fn list_company_invites(conn: &Connection, company_id: &str) -> rusqlite::Result<Vec<CleanerInvite>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVITE_COLUMNS} FROM cleaner_invites WHERE company_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![company_id], parse_invite_row)?;
    rows.collect()
}

/// Marks a pending invite accepted. Returns false if it is no longer pending.
pub fn mark_invite_accepted(
    conn: &Connection,
    id: &str,
    accepted_by: &str,
    at: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cleaner_invites SET status = 'accepted', accepted_by = ?1, accepted_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        params![accepted_by, format_ts(at), id],
    )?;
    Ok(count > 0)
}

pub fn transition_invite_status(
    conn: &Connection,
    id: &str,
    from: InviteStatus,
    to: InviteStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cleaner_invites SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to.as_str(), id, from.as_str()],
    )?;
    Ok(count > 0)
}
