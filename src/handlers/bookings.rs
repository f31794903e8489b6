use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries, queries::BookingFilter};
use crate::errors::{AppError, AppResult};
use crate::handlers::auth::{AuthUser, MaybeUser};
use crate::models::{Booking, BookingStatus};
use crate::services::bookings::{self, CancelBookingInput, CreateBookingInput, UpdateBookingInput};
use crate::services::notify::Notification;
use crate::state::AppState;

fn status_changed(conn: &Connection, booking: &Booking) -> AppResult<Option<Notification>> {
    Ok(queries::get_user(conn, &booking.customer_id)?.map(|customer| {
        Notification::BookingStatusChanged {
            booking_id: booking.id.clone(),
            customer_email: customer.email,
            status: booking.status.as_str().to_string(),
        }
    }))
}

async fn respond(state: &AppState, (booking, notification): (Booking, Option<Notification>)) -> Json<Booking> {
    if let Some(notification) = notification {
        state.notify(notification).await;
    }
    Json(booking)
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    status: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl BookingListQuery {
    fn filter(&self) -> AppResult<BookingFilter> {
        let status = match self.status.as_deref() {
            Some(s) => Some(
                BookingStatus::parse(s)
                    .ok_or_else(|| AppError::validation(format!("unknown booking status: {s}")))?,
            ),
            None => None,
        };
        Ok(BookingFilter {
            status,
            from_date: self.from,
            to_date: self.to,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

// POST /api/bookings
#[derive(Serialize)]
pub struct CreateBookingResponse {
    booking: Booking,
    /// Issued when checkout created a guest account.
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Json(input): Json<CreateBookingInput>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    let now = db::now();
    let created = {
        let mut db = state.conn()?;
        bookings::create_booking(
            &mut db,
            user.as_ref(),
            &input,
            state.config.platform_fee_percentage,
            now,
        )?
    };

    let customer_email = match (&created.guest, &user) {
        (Some(guest), _) => guest.email.clone(),
        (None, Some(user)) => user.email.clone(),
        (None, None) => String::new(),
    };
    let session_token = match &created.guest {
        Some(guest) => Some(state.tokens.issue(&guest.id, now)?),
        None => None,
    };

    let booking = created.booking;
    state
        .notify(Notification::BookingCreated {
            booking_id: booking.id.clone(),
            customer_email,
            scheduled_for: format!("{} {}", db::format_date(&booking.scheduled_date), booking.scheduled_time),
            total_price: booking.total_price,
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking,
            session_token,
        }),
    ))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let db = state.conn()?;
    Ok(Json(bookings::get_booking(&db, &user, &id)?))
}

// GET /api/bookings/mine
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let filter = query.filter()?;
    let db = state.conn()?;
    Ok(Json(bookings::my_bookings(&db, &user, &filter)?))
}

// GET /api/jobs/mine
pub async fn my_jobs(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let filter = query.filter()?;
    let db = state.conn()?;
    Ok(Json(bookings::my_jobs(&db, &user, &filter)?))
}

// GET /api/bookings/upcoming
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    limit: Option<i64>,
}

pub async fn upcoming_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let today = db::now().date();
    let db = state.conn()?;
    Ok(Json(bookings::upcoming_bookings(&db, &user, query.limit, today)?))
}

// POST /api/bookings/:id/update
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateBookingInput>,
) -> AppResult<Json<Booking>> {
    let db = state.conn()?;
    Ok(Json(bookings::update_booking(&db, &user, &id, &input, db::now())?))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let result = {
        let db = state.conn()?;
        let booking = bookings::confirm_booking(&db, &user, &id, db::now())?;
        let notification = status_changed(&db, &booking)?;
        (booking, notification)
    };
    Ok(respond(&state, result).await)
}

// POST /api/bookings/:id/start
pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let result = {
        let db = state.conn()?;
        let booking = bookings::start_booking(&db, &user, &id, db::now())?;
        let notification = status_changed(&db, &booking)?;
        (booking, notification)
    };
    Ok(respond(&state, result).await)
}

// POST /api/bookings/:id/complete
#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    notes: Option<String>,
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CompleteRequest>>,
) -> AppResult<Json<Booking>> {
    let notes = body.and_then(|Json(req)| req.notes);
    let result = {
        let mut db = state.conn()?;
        let booking = bookings::complete_booking(&mut db, &user, &id, notes.as_deref(), db::now())?;
        let notification = status_changed(&db, &booking)?;
        (booking, notification)
    };
    Ok(respond(&state, result).await)
}

// POST /api/bookings/:id/no-show
pub async fn mark_no_show(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let result = {
        let db = state.conn()?;
        let booking = bookings::mark_no_show(&db, &user, &id, db::now())?;
        let notification = status_changed(&db, &booking)?;
        (booking, notification)
    };
    Ok(respond(&state, result).await)
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<CancelBookingInput>,
) -> AppResult<Json<Booking>> {
    let result = {
        let mut db = state.conn()?;
        let booking = bookings::cancel_booking(&mut db, &user, &id, &input, db::now())?;
        let notification = status_changed(&db, &booking)?;
        (booking, notification)
    };
    Ok(respond(&state, result).await)
}
