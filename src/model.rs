use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;

/// Minute offset from midnight — the only time-of-day type.
pub type Minutes = i32;

/// Parse a zero-padded 24-hour "HH:MM" string into a minute offset.
/// "24:00" is accepted as an end-of-day window boundary.
pub fn parse_hhmm(s: &str) -> Result<Minutes, EngineError> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| EngineError::InvalidTime(s.into()))?;
    if h.len() != 2 || m.len() != 2 {
        return Err(EngineError::InvalidTime(s.into()));
    }
    let h: Minutes = h.parse().map_err(|_| EngineError::InvalidTime(s.into()))?;
    let m: Minutes = m.parse().map_err(|_| EngineError::InvalidTime(s.into()))?;
    if !(0..=24).contains(&h) || !(0..=59).contains(&m) || (h == 24 && m != 0) {
        return Err(EngineError::InvalidTime(s.into()));
    }
    Ok(h * 60 + m)
}

/// Format a minute offset back to zero-padded "HH:MM".
pub fn format_hhmm(m: Minutes) -> String {
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Day-of-week as stored on the wire: 0=Sunday .. 6=Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Half-open same-day interval `[start, end)` in minutes from midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Minutes,
    pub end: Minutes,
}

impl Window {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    /// Parse a `("HH:MM", "HH:MM")` pair, rejecting empty or inverted ranges.
    pub fn parse(start: &str, end: &str) -> Result<Self, EngineError> {
        let s = parse_hhmm(start)?;
        let e = parse_hhmm(end)?;
        if s >= e {
            return Err(EngineError::InvalidTime(format!("{start}-{end}")));
        }
        Ok(Self { start: s, end: e })
    }

    pub fn duration_min(&self) -> Minutes {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A bookable offering published by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Ulid,
    pub provider_id: Ulid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price per hour, in bank-hours.
    pub hourly_rate: f64,
    pub requires_scheduling: bool,
    #[serde(default)]
    pub min_booking_hours: Option<f64>,
    #[serde(default)]
    pub max_booking_hours: Option<f64>,
    /// How far ahead a booking must be made, in days.
    #[serde(default)]
    pub advance_booking_days: Option<u32>,
    /// Minimum notice to cancel without penalty, in hours.
    #[serde(default)]
    pub cancellation_hours: Option<u32>,
    pub is_active: bool,
}

/// One recurring weekly availability window for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchedule {
    pub id: Ulid,
    pub service_id: Ulid,
    pub provider_id: Ulid,
    /// 0=Sunday .. 6=Saturday.
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

impl ServiceSchedule {
    pub fn window(&self) -> Result<Window, EngineError> {
        Window::parse(&self.start_time, &self.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    Unavailable,
    CustomHours,
    Holiday,
}

/// A date-specific override that fully supersedes the recurring schedule
/// for that date. `start_time`/`end_time` are only meaningful for
/// `CustomHours`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleException {
    pub id: Ulid,
    pub service_id: Ulid,
    pub provider_id: Ulid,
    pub exception_date: NaiveDate,
    pub exception_type: ExceptionType,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ScheduleException {
    /// The explicit window of a `CustomHours` exception, if both bounds are
    /// present and parse. `None` for the zeroing exception types.
    pub fn custom_window(&self) -> Result<Option<Window>, EngineError> {
        if self.exception_type != ExceptionType::CustomHours {
            return Ok(None);
        }
        match (&self.start_time, &self.end_time) {
            (Some(s), Some(e)) => Ok(Some(Window::parse(s, e)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    CancelledByConsumer,
    CancelledByProvider,
    NoShowConsumer,
    NoShowProvider,
}

impl BookingStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed
                | BookingStatus::CancelledByConsumer
                | BookingStatus::CancelledByProvider
                | BookingStatus::NoShowConsumer
                | BookingStatus::NoShowProvider
        )
    }

    /// The legal forward transitions of the booking lifecycle.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match self {
            Pending => matches!(next, Confirmed | CancelledByConsumer | CancelledByProvider),
            Confirmed => matches!(
                next,
                InProgress
                    | CancelledByConsumer
                    | CancelledByProvider
                    | NoShowConsumer
                    | NoShowProvider
            ),
            InProgress => matches!(next, Completed | CancelledByConsumer | CancelledByProvider),
            Completed | CancelledByConsumer | CancelledByProvider | NoShowConsumer
            | NoShowProvider => false,
        }
    }
}

/// A reservation of a service for a specific date/time interval.
/// Never mutated once in a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Ulid,
    pub service_id: Ulid,
    pub provider_id: Ulid,
    pub consumer_id: Ulid,
    pub booking_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    /// Booked length in hours.
    pub duration: f64,
    /// Price in bank-hours: `duration * service.hourly_rate`.
    pub total_cost: f64,
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub provider_notes: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Backs optimistic-concurrency status writes, like `User::version`.
    #[serde(default)]
    pub version: u64,
}

impl Booking {
    pub fn window(&self) -> Result<Window, EngineError> {
        Window::parse(&self.start_time, &self.end_time)
    }
}

/// One candidate bookable interval of the requested duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    #[serde(default)]
    pub conflict_reason: Option<String>,
}

/// Day-by-day calendar projection row (read-only, for rendering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub schedules: Vec<ServiceSchedule>,
    #[serde(default)]
    pub exception: Option<ScheduleException>,
    pub bookings: Vec<Booking>,
    /// True iff the resolved window set for the date is non-empty.
    pub is_available: bool,
}

/// Bank-hours balance holder. `version` backs optimistic-concurrency writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Ulid,
    pub bank_hours: f64,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// The economic record paired 1:1 with a booking. Marking it COMPLETED
/// triggers the bank-hours transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Ulid,
    pub booking_id: Ulid,
    pub consumer_id: Ulid,
    pub provider_id: Ulid,
    pub hours_spent: f64,
    pub status: TransactionStatus,
}
