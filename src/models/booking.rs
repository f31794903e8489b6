use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::service::{Frequency, ServiceAddOn, ServiceType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub cleaner_id: String,
    pub cleaner_profile_id: String,
    pub address_id: String,
    pub service_type: ServiceType,
    pub frequency: Frequency,
    pub add_ons: Vec<ServiceAddOn>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub duration_minutes: i32,
    pub cleaner_hourly_rate: i64,
    pub service_price: i64,
    pub add_ons_price: i64,
    pub travel_fee: i64,
    pub platform_fee: i64,
    pub total_price: i64,
    pub cleaner_payout: i64,
    pub status: BookingStatus,
    pub customer_notes: Option<String>,
    pub cleaner_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancellation_note: Option<String>,
    pub cancelled_by: Option<String>,
    pub parent_booking_id: Option<String>,
    pub next_booking_id: Option<String>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

/// Lifecycle moves that change a booking's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Start,
    Complete,
    Cancel,
    MarkNoShow,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Start => "start",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
            BookingAction::MarkNoShow => "mark as no-show",
        }
    }
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// The status `action` leads to from `self`, or `None` if the move is
    /// not part of the lifecycle.
    pub fn next(&self, action: BookingAction) -> Option<BookingStatus> {
        use BookingAction::*;
        use BookingStatus::*;

        match (self, action) {
            (Pending, Confirm) => Some(Confirmed),
            (Confirmed, Start) => Some(InProgress),
            (InProgress, Complete) => Some(Completed),
            (Confirmed, MarkNoShow) => Some(NoShow),
            (s, Cancel) if !s.is_terminal() => Some(Cancelled),
            _ => None,
        }
    }

    /// Statuses that occupy the cleaner's calendar for matching purposes.
    pub fn blocks_schedule(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::InProgress)
    }
}
