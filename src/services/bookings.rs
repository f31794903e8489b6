use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries::{self, BookingFilter};
use crate::errors::{AppError, AppResult};
use crate::models::availability::parse_time;
use crate::models::{
    Address, Booking, BookingAction, BookingStatus, Frequency, Role, ServiceAddOn, ServiceType,
    TimeWindow, Transaction, TransactionStatus, User,
};
use crate::services::{matching, pricing};

#[derive(Debug, Clone, Deserialize)]
pub struct GuestDetails {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingInput {
    pub cleaner_profile_id: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub add_ons: Vec<ServiceAddOn>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub address_id: Option<String>,
    pub address: Option<AddressInput>,
    pub customer_notes: Option<String>,
    /// Inline account details for checkout without a session.
    pub guest: Option<GuestDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookingInput {
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub customer_notes: Option<String>,
}

#[derive(Debug)]
pub struct CreatedBooking {
    pub booking: Booking,
    /// Set when checkout created a new account.
    pub guest: Option<User>,
}

fn validate_time(time: &str) -> AppResult<()> {
    parse_time(time).map_err(|e| AppError::validation(e.to_string()))?;
    Ok(())
}

/// The slot a job occupies. Jobs that would run past midnight are rejected.
fn job_window(time: &str, duration_minutes: i32) -> AppResult<TimeWindow> {
    TimeWindow::from_duration(time, duration_minutes).map_err(|e| AppError::validation(e.to_string()))
}

fn create_guest(conn: &Connection, guest: &GuestDetails, now: NaiveDateTime) -> AppResult<User> {
    let email = guest.email.trim();
    if !email.contains('@') {
        return Err(AppError::validation("a valid e-mail address is required"));
    }
    if guest.first_name.trim().is_empty() || guest.last_name.trim().is_empty() {
        return Err(AppError::validation("first and last name are required"));
    }
    if queries::get_user_by_email(conn, email)?.is_some() {
        return Err(AppError::conflict(
            "an account with this e-mail already exists; sign in to book",
        ));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        first_name: guest.first_name.trim().to_string(),
        last_name: guest.last_name.trim().to_string(),
        phone: guest.phone.clone(),
        role: Role::Client,
        created_at: now,
        updated_at: now,
    };
    queries::create_user(conn, &user)?;
    tracing::info!(user_id = %user.id, "guest account created at checkout");
    Ok(user)
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Resolves the booking address: an existing one the customer owns, a
/// matching entry from their address book, or a new entry.
fn resolve_address(conn: &Connection, customer: &User, input: &CreateBookingInput, now: NaiveDateTime) -> AppResult<Address> {
    if let Some(id) = &input.address_id {
        return match queries::get_address(conn, id)? {
            Some(address) if address.user_id == customer.id => Ok(address),
            _ => Err(AppError::NotFound("address")),
        };
    }

    let Some(new) = &input.address else {
        return Err(AppError::validation("an address is required"));
    };
    if new.street.trim().is_empty() || new.city.trim().is_empty() {
        return Err(AppError::validation("street and city are required"));
    }

    let existing = queries::list_addresses(conn, &customer.id)?;
    let postal = new.postal_code.as_deref().map(str::trim);
    if let Some(address) = existing.iter().find(|a| {
        same_text(&a.street, &new.street)
            && same_text(&a.city, &new.city)
            && a.postal_code.as_deref().map(str::trim) == postal
    }) {
        return Ok(address.clone());
    }

    let address = Address {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: customer.id.clone(),
        street: new.street.trim().to_string(),
        city: new.city.trim().to_string(),
        neighborhood: new.neighborhood.clone(),
        postal_code: new.postal_code.clone(),
        is_default: existing.is_empty(),
        created_at: now,
    };
    queries::create_address(conn, &address)?;
    Ok(address)
}

/// Creates a pending booking with a frozen price snapshot. Without a
/// session, `input.guest` must describe a new account.
pub fn create_booking(
    conn: &mut Connection,
    actor: Option<&User>,
    input: &CreateBookingInput,
    platform_fee_percentage: f64,
    now: NaiveDateTime,
) -> AppResult<CreatedBooking> {
    validate_time(&input.scheduled_time)?;
    if actor.is_none() && input.guest.is_none() {
        return Err(AppError::Unauthenticated);
    }

    let tx = conn.transaction()?;

    let (customer, guest) = match actor {
        Some(user) => (user.clone(), None),
        None => {
            let details = input.guest.as_ref().ok_or(AppError::Unauthenticated)?;
            let user = create_guest(&tx, details, now)?;
            (user.clone(), Some(user))
        }
    };

    let profile = queries::get_cleaner_profile(&tx, &input.cleaner_profile_id)?
        .ok_or(AppError::NotFound("cleaner"))?;
    let service = queries::get_service_definition(&tx, input.service_type)?
        .ok_or(AppError::NotFound("service"))?;
    let address = resolve_address(&tx, &customer, input, now)?;

    let areas = queries::list_service_areas(&tx, &profile.id)?;
    let travel_fee = matching::resolve_travel_fee(
        &areas,
        &address.city,
        address.neighborhood.as_deref(),
        address.postal_code.as_deref(),
    )
    .ok_or_else(|| AppError::validation("cleaner does not service this address"))?;

    let catalog = queries::list_add_on_definitions(&tx)?;
    let price = pricing::calculate_price(
        &profile,
        &service,
        &catalog,
        &input.add_ons,
        travel_fee,
        platform_fee_percentage,
    )?;

    let window = job_window(&input.scheduled_time, price.duration_minutes())?;
    if !matching::is_slot_free(&tx, &profile.id, input.scheduled_date, &window)? {
        return Err(AppError::conflict("cleaner is not available at the requested time"));
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        cleaner_id: profile.user_id.clone(),
        cleaner_profile_id: profile.id.clone(),
        address_id: address.id.clone(),
        service_type: input.service_type,
        frequency: input.frequency,
        add_ons: input.add_ons.clone(),
        scheduled_date: input.scheduled_date,
        scheduled_time: input.scheduled_time.clone(),
        duration_minutes: price.duration_minutes(),
        cleaner_hourly_rate: price.hourly_rate,
        service_price: price.service_price,
        add_ons_price: price.add_ons_price,
        travel_fee: price.travel_fee,
        platform_fee: price.platform_fee,
        total_price: price.total_price,
        cleaner_payout: price.cleaner_payout,
        status: BookingStatus::Pending,
        customer_notes: input.customer_notes.clone(),
        cleaner_notes: None,
        cancellation_reason: None,
        cancellation_note: None,
        cancelled_by: None,
        parent_booking_id: None,
        next_booking_id: None,
        confirmed_at: None,
        started_at: None,
        completed_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&tx, &booking)?;
    queries::increment_cleaner_total_bookings(&tx, &profile.id)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        cleaner_profile_id = %booking.cleaner_profile_id,
        total_price = booking.total_price,
        "booking created"
    );
    Ok(CreatedBooking { booking, guest })
}

fn load(conn: &Connection, id: &str) -> AppResult<Booking> {
    queries::get_booking_by_id(conn, id)?.ok_or(AppError::NotFound("booking"))
}

fn ensure_assigned_cleaner(booking: &Booking, actor: &User) -> AppResult<()> {
    if booking.cleaner_id != actor.id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Applies `action` with a conditional write. Zero affected rows means a
/// concurrent request moved the booking first.
fn apply(conn: &Connection, booking: &Booking, action: BookingAction, now: NaiveDateTime) -> AppResult<BookingStatus> {
    let next = booking.status.next(action).ok_or(AppError::InvalidTransition {
        action: action.as_str(),
        status: booking.status.as_str(),
    })?;

    if !queries::transition_booking_status(conn, &booking.id, booking.status, next, &now)? {
        return Err(AppError::conflict("booking was changed by another request; reload and retry"));
    }

    tracing::info!(
        booking_id = %booking.id,
        from = booking.status.as_str(),
        to = next.as_str(),
        "booking status changed"
    );
    Ok(next)
}

/// Pending bookings do not hold the slot, so the cleaner's calendar is
/// checked again before confirming.
pub fn confirm_booking(conn: &Connection, actor: &User, id: &str, now: NaiveDateTime) -> AppResult<Booking> {
    let booking = load(conn, id)?;
    ensure_assigned_cleaner(&booking, actor)?;
    if booking.status == BookingStatus::Pending {
        let window = job_window(&booking.scheduled_time, booking.duration_minutes)?;
        if !matching::is_slot_free(conn, &booking.cleaner_profile_id, booking.scheduled_date, &window)? {
            return Err(AppError::conflict("cleaner already has a confirmed job at this time"));
        }
    }
    apply(conn, &booking, BookingAction::Confirm, now)?;
    load(conn, id)
}

pub fn start_booking(conn: &Connection, actor: &User, id: &str, now: NaiveDateTime) -> AppResult<Booking> {
    let booking = load(conn, id)?;
    ensure_assigned_cleaner(&booking, actor)?;
    apply(conn, &booking, BookingAction::Start, now)?;
    load(conn, id)
}

pub fn mark_no_show(conn: &Connection, actor: &User, id: &str, now: NaiveDateTime) -> AppResult<Booking> {
    let booking = load(conn, id)?;
    ensure_assigned_cleaner(&booking, actor)?;
    apply(conn, &booking, BookingAction::MarkNoShow, now)?;
    load(conn, id)
}

/// Completes the job, attaches cleaner notes, bumps the cleaner's completed
/// counter and records a pending ledger row, all in one transaction.
pub fn complete_booking(
    conn: &mut Connection,
    actor: &User,
    id: &str,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<Booking> {
    let tx = conn.transaction()?;
    let booking = load(&tx, id)?;
    ensure_assigned_cleaner(&booking, actor)?;
    apply(&tx, &booking, BookingAction::Complete, now)?;

    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        queries::set_booking_cleaner_notes(&tx, id, notes)?;
    }
    queries::increment_cleaner_completed_bookings(&tx, &booking.cleaner_profile_id)?;
    queries::create_transaction(
        &tx,
        &Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            amount: booking.total_price,
            platform_fee: booking.platform_fee,
            cleaner_payout: booking.cleaner_payout,
            status: TransactionStatus::Pending,
            provider_reference: None,
            created_at: now,
        },
    )?;
    tx.commit()?;

    load(conn, id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelBookingInput {
    pub reason: String,
    pub note: Option<String>,
}

pub fn cancel_booking(
    conn: &mut Connection,
    actor: &User,
    id: &str,
    input: &CancelBookingInput,
    now: NaiveDateTime,
) -> AppResult<Booking> {
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("a cancellation reason is required"));
    }

    let tx = conn.transaction()?;
    let booking = load(&tx, id)?;
    let allowed = booking.customer_id == actor.id
        || booking.cleaner_id == actor.id
        || actor.role.is_global_admin();
    if !allowed {
        return Err(AppError::Forbidden);
    }

    apply(&tx, &booking, BookingAction::Cancel, now)?;
    queries::record_booking_cancellation(&tx, id, reason, input.note.as_deref(), &actor.id)?;
    tx.commit()?;

    load(conn, id)
}

/// Reschedules or re-notes a pending booking. Only the customer may do this.
pub fn update_booking(
    conn: &Connection,
    actor: &User,
    id: &str,
    input: &UpdateBookingInput,
    now: NaiveDateTime,
) -> AppResult<Booking> {
    if let Some(time) = &input.scheduled_time {
        validate_time(time)?;
    }

    let booking = load(conn, id)?;
    if booking.customer_id != actor.id {
        return Err(AppError::Forbidden);
    }
    if booking.status != BookingStatus::Pending {
        return Err(AppError::invalid_state(format!(
            "only pending bookings can be updated; this booking is {}",
            booking.status.as_str()
        )));
    }

    let date = input.scheduled_date.unwrap_or(booking.scheduled_date);
    let time = input
        .scheduled_time
        .clone()
        .unwrap_or_else(|| booking.scheduled_time.clone());
    let notes = input.customer_notes.clone().or(booking.customer_notes.clone());

    let rescheduled = date != booking.scheduled_date || time != booking.scheduled_time;
    if rescheduled {
        let window = job_window(&time, booking.duration_minutes)?;
        if !matching::is_slot_free(conn, &booking.cleaner_profile_id, date, &window)? {
            return Err(AppError::conflict("cleaner is not available at the requested time"));
        }
    }

    if !queries::update_pending_booking(conn, id, &date, &time, notes.as_deref(), &now)? {
        return Err(AppError::conflict("booking was changed by another request; reload and retry"));
    }
    load(conn, id)
}

/// Visible to its customer, its cleaner and global admins. Everyone else
/// sees not-found.
pub fn get_booking(conn: &Connection, actor: &User, id: &str) -> AppResult<Booking> {
    let booking = load(conn, id)?;
    if booking.customer_id == actor.id || booking.cleaner_id == actor.id || actor.role.is_global_admin() {
        Ok(booking)
    } else {
        Err(AppError::NotFound("booking"))
    }
}

pub fn my_bookings(conn: &Connection, actor: &User, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
    Ok(queries::list_customer_bookings(conn, &actor.id, filter)?)
}

pub fn my_jobs(conn: &Connection, actor: &User, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
    let profile = queries::get_cleaner_profile_by_user(conn, &actor.id)?.ok_or(AppError::Forbidden)?;
    Ok(queries::list_cleaner_jobs(conn, &profile.id, filter)?)
}

pub fn upcoming_bookings(conn: &Connection, actor: &User, limit: Option<i64>, today: NaiveDate) -> AppResult<Vec<Booking>> {
    let limit = limit.unwrap_or(10).clamp(1, 50);
    Ok(queries::list_upcoming_bookings(conn, &actor.id, &today, limit)?)
}
