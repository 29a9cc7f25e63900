use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::MAX_CALENDAR_DAYS;
use crate::model::*;
use crate::store::ScheduleStore;

use super::conflict::CONFLICT_EXCLUDED;
use super::slots::resolve_windows;
use super::{Engine, EngineError};

impl<S: ScheduleStore> Engine<S> {
    /// Day-by-day projection of a provider's recurring schedules, exceptions
    /// and bookings over an inclusive date range. Read-only — used to render
    /// calendars, never to allocate slots. Window resolution is the same
    /// routine slot generation uses.
    pub async fn availability_calendar(
        &self,
        provider_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayAvailability>, EngineError> {
        if to < from {
            return Err(EngineError::InvalidInput("date range is inverted"));
        }
        let days = (to - from).num_days() as usize + 1;
        if days > MAX_CALENDAR_DAYS {
            return Err(EngineError::LimitExceeded("date range too wide"));
        }

        let mut projection = Vec::with_capacity(days);
        let mut date = from;
        while date <= to {
            let dow = day_of_week(date);
            let schedules = self
                .store()
                .list_provider_schedules(provider_id, Some(dow), true)
                .await?;
            let exceptions = self
                .store()
                .list_provider_exceptions(provider_id, date)
                .await?;
            let bookings = self
                .store()
                .list_provider_bookings(provider_id, date, CONFLICT_EXCLUDED)
                .await?;

            let windows = resolve_windows(&schedules, &exceptions)?;
            projection.push(DayAvailability {
                date,
                day_of_week: dow,
                schedules,
                exception: exceptions.into_iter().next(),
                bookings,
                is_available: !windows.is_empty(),
            });

            date = date
                .succ_opt()
                .ok_or(EngineError::InvalidInput("date out of range"))?;
        }
        Ok(projection)
    }
}
