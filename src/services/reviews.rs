use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::review::is_valid_rating;
use crate::models::{BookingStatus, Review, ReviewStatus, User};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewInput {
    pub booking_id: String,
    pub rating: i32,
    pub quality_rating: Option<i32>,
    pub punctuality_rating: Option<i32>,
    pub communication_rating: Option<i32>,
    pub comment: Option<String>,
}

/// Leaves the single review a customer may write for a completed booking
/// and refreshes the cleaner's rating aggregates in the same transaction.
pub fn create_review(
    conn: &mut Connection,
    author: &User,
    input: &CreateReviewInput,
    now: NaiveDateTime,
) -> AppResult<Review> {
    let ratings = [
        Some(input.rating),
        input.quality_rating,
        input.punctuality_rating,
        input.communication_rating,
    ];
    if ratings.into_iter().flatten().any(|r| !is_valid_rating(r)) {
        return Err(AppError::validation("ratings must be between 1 and 5"));
    }

    let tx = conn.transaction()?;
    let booking = match queries::get_booking_by_id(&tx, &input.booking_id)? {
        Some(b) if b.customer_id == author.id => b,
        _ => return Err(AppError::NotFound("booking")),
    };
    if booking.status != BookingStatus::Completed {
        return Err(AppError::invalid_state(format!(
            "only completed bookings can be reviewed; this booking is {}",
            booking.status.as_str()
        )));
    }
    if queries::get_review_for_booking(&tx, &booking.id)?.is_some() {
        return Err(AppError::conflict("this booking has already been reviewed"));
    }

    let review = Review {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking.id.clone(),
        customer_id: author.id.clone(),
        cleaner_profile_id: booking.cleaner_profile_id.clone(),
        rating: input.rating,
        quality_rating: input.quality_rating,
        punctuality_rating: input.punctuality_rating,
        communication_rating: input.communication_rating,
        comment: input.comment.clone(),
        status: ReviewStatus::Pending,
        created_at: now,
    };
    queries::create_review(&tx, &review)?;
    queries::refresh_cleaner_rating(&tx, &booking.cleaner_profile_id)?;
    tx.commit()?;

    tracing::info!(review_id = %review.id, booking_id = %booking.id, rating = review.rating, "review created");
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{CleanerProfile, Role, ServiceArea, ServiceType};
    use crate::services::bookings::{self, AddressInput, CreateBookingInput};

    fn user(conn: &Connection, id: &str, role: Role) -> User {
        let now = db::now();
        let user = User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            phone: None,
            role,
            created_at: now,
            updated_at: now,
        };
        queries::create_user(conn, &user).unwrap();
        user
    }

    fn completed_booking(conn: &mut Connection, customer: &User, cleaner: &User, profile: &CleanerProfile, time: &str) -> String {
        let input = CreateBookingInput {
            cleaner_profile_id: profile.id.clone(),
            service_type: ServiceType::WindowCleaning,
            frequency: Default::default(),
            add_ons: vec![],
            scheduled_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            scheduled_time: time.to_string(),
            address_id: None,
            address: Some(AddressInput {
                street: "Str. Lalelelor 1".to_string(),
                city: "Cluj-Napoca".to_string(),
                neighborhood: None,
                postal_code: None,
            }),
            customer_notes: None,
            guest: None,
        };
        let id = bookings::create_booking(conn, Some(customer), &input, 15.0, db::now())
            .unwrap()
            .booking
            .id;
        bookings::confirm_booking(conn, cleaner, &id, db::now()).unwrap();
        bookings::start_booking(conn, cleaner, &id, db::now()).unwrap();
        bookings::complete_booking(conn, cleaner, &id, None, db::now()).unwrap();
        id
    }

    fn seed() -> (Connection, User, User, CleanerProfile) {
        let conn = db::init_db(":memory:").unwrap();
        let customer = user(&conn, "customer", Role::Client);
        let cleaner = user(&conn, "cleaner", Role::Cleaner);
        let profile = CleanerProfile::new_for_user(&cleaner.id, None, db::now());
        queries::create_cleaner_profile(&conn, &profile).unwrap();
        queries::create_service_area(
            &conn,
            &ServiceArea {
                id: "area".to_string(),
                cleaner_profile_id: profile.id.clone(),
                city: "Cluj-Napoca".to_string(),
                neighborhood: None,
                postal_code: None,
                travel_fee: 0,
                is_preferred: false,
                created_at: db::now(),
            },
        )
        .unwrap();
        (conn, customer, cleaner, profile)
    }

    fn review_input(booking_id: &str, rating: i32) -> CreateReviewInput {
        CreateReviewInput {
            booking_id: booking_id.to_string(),
            rating,
            quality_rating: Some(5),
            punctuality_rating: None,
            communication_rating: None,
            comment: None,
        }
    }

    #[test]
    fn test_reviews_update_cleaner_average() {
        let (mut conn, customer, cleaner, profile) = seed();
        let first = completed_booking(&mut conn, &customer, &cleaner, &profile, "08:00");
        let second = completed_booking(&mut conn, &customer, &cleaner, &profile, "12:00");

        create_review(&mut conn, &customer, &review_input(&first, 5), db::now()).unwrap();
        create_review(&mut conn, &customer, &review_input(&second, 4), db::now()).unwrap();

        let profile = queries::get_cleaner_profile(&conn, &profile.id).unwrap().unwrap();
        assert_eq!(profile.total_reviews, 2);
        assert!((profile.average_rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_review_per_booking() {
        let (mut conn, customer, cleaner, profile) = seed();
        let id = completed_booking(&mut conn, &customer, &cleaner, &profile, "08:00");

        create_review(&mut conn, &customer, &review_input(&id, 5), db::now()).unwrap();
        let err = create_review(&mut conn, &customer, &review_input(&id, 1), db::now()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_review_guards() {
        let (mut conn, customer, cleaner, profile) = seed();
        let id = completed_booking(&mut conn, &customer, &cleaner, &profile, "08:00");

        let err = create_review(&mut conn, &customer, &review_input(&id, 6), db::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_review(&mut conn, &cleaner, &review_input(&id, 5), db::now()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let profile_after = queries::get_cleaner_profile(&conn, &profile.id).unwrap().unwrap();
        assert_eq!(profile_after.total_reviews, 0);
    }
}
