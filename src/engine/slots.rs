use std::time::Instant;

use chrono::NaiveDate;
use tracing::warn;
use ulid::Ulid;

use crate::limits::MAX_DURATION_HOURS;
use crate::model::*;
use crate::store::ScheduleStore;

use super::conflict::{CONFLICT_EXCLUDED, booked_windows};
use super::{Engine, EngineError};

// ── Slot Generation Algorithm ─────────────────────────────────────

/// Fixed scan resolution. Candidate slot starts advance in 30-minute steps
/// regardless of the requested duration — behavior-compatible with the
/// stored data this engine serves, so never derived from duration.
pub const SLOT_STEP_MIN: Minutes = 30;

pub(super) const CONFLICT_REASON: &str = "Time slot already booked";

/// Resolve the availability window set for one date.
///
/// An exception fully supersedes the recurring schedule: UNAVAILABLE and
/// HOLIDAY zero out availability; CUSTOM_HOURS replaces the weekly windows
/// with the exception's explicit window(s). Without an exception the active
/// weekly schedules stand, overlapping entries treated as a union.
pub fn resolve_windows(
    schedules: &[ServiceSchedule],
    exceptions: &[ScheduleException],
) -> Result<Vec<Window>, EngineError> {
    if exceptions.iter().any(|e| {
        matches!(
            e.exception_type,
            ExceptionType::Unavailable | ExceptionType::Holiday
        )
    }) {
        return Ok(Vec::new());
    }

    let mut custom = Vec::new();
    for e in exceptions {
        match e.custom_window()? {
            Some(w) => custom.push(w),
            None if e.exception_type == ExceptionType::CustomHours => {
                // exception without usable times contributes nothing
                warn!(exception = %e.id, "CUSTOM_HOURS exception missing start/end, ignoring");
            }
            None => {}
        }
    }
    if !custom.is_empty() {
        custom.sort_by_key(|w| w.start);
        return Ok(custom);
    }

    let mut windows = Vec::with_capacity(schedules.len());
    for s in schedules.iter().filter(|s| s.is_active) {
        windows.push(s.window()?);
    }
    windows.sort_by_key(|w| w.start);
    Ok(windows)
}

/// Walk each window in 30-minute steps producing candidate slots of
/// `duration_min`, marking any that overlap a booked interval.
pub fn scan_windows(windows: &[Window], duration_min: Minutes, booked: &[Window]) -> Vec<TimeSlot> {
    let mut slots = Vec::new();
    for w in windows {
        let mut m = w.start;
        while m + duration_min <= w.end {
            let candidate = Window::new(m, m + duration_min);
            let conflict = booked.iter().any(|b| candidate.overlaps(b));
            slots.push(TimeSlot {
                start_time: format_hhmm(candidate.start),
                end_time: format_hhmm(candidate.end),
                is_available: !conflict,
                conflict_reason: conflict.then(|| CONFLICT_REASON.to_string()),
            });
            m += SLOT_STEP_MIN;
        }
    }
    // zero-padded "HH:MM" makes the lexicographic sort chronological
    slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    slots
}

pub(super) fn hours_to_minutes(duration_hours: f64) -> Result<Minutes, EngineError> {
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(EngineError::InvalidInput("duration must be positive"));
    }
    if duration_hours > MAX_DURATION_HOURS {
        return Err(EngineError::LimitExceeded("duration exceeds one day"));
    }
    let minutes = (duration_hours * 60.0).round() as Minutes;
    if minutes == 0 {
        return Err(EngineError::InvalidInput("duration rounds to zero minutes"));
    }
    Ok(minutes)
}

impl<S: ScheduleStore> Engine<S> {
    /// Ordered candidate slots of `duration_hours` for a service on a date.
    ///
    /// An empty vec is a valid outcome (no schedule for that date); a
    /// missing service is `NotFound`. Pure function of stored state —
    /// calling twice with no intervening writes yields identical results.
    pub async fn available_slots(
        &self,
        service_id: Ulid,
        date: NaiveDate,
        duration_hours: f64,
    ) -> Result<Vec<TimeSlot>, EngineError> {
        let started = Instant::now();
        let duration_min = hours_to_minutes(duration_hours)?;

        // resolve the service first so "service not found" and "no slots"
        // stay distinguishable outcomes
        self.store().get_service(service_id).await?;

        let dow = day_of_week(date);
        let schedules = self.store().list_schedules(service_id, Some(dow), true).await?;
        let exceptions = self.store().list_exceptions(service_id, date).await?;
        let windows = resolve_windows(&schedules, &exceptions)?;
        if windows.is_empty() {
            metrics::counter!(crate::observability::SLOT_QUERIES_TOTAL).increment(1);
            return Ok(Vec::new());
        }

        let bookings = self
            .store()
            .list_bookings(service_id, date, CONFLICT_EXCLUDED)
            .await?;
        let booked = booked_windows(&bookings)?;

        let slots = scan_windows(&windows, duration_min, &booked);
        metrics::counter!(crate::observability::SLOT_QUERIES_TOTAL).increment(1);
        metrics::histogram!(crate::observability::SLOT_QUERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        Ok(slots)
    }
}
