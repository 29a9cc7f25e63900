use crate::model::*;

use super::EngineError;

/// Statuses excluded when fetching bookings for conflict purposes. Both
/// cancellation variants free the slot; completed and no-show bookings
/// stay in the set because their time was consumed or forfeited.
pub(super) const CONFLICT_EXCLUDED: &[BookingStatus] = &[
    BookingStatus::CancelledByConsumer,
    BookingStatus::CancelledByProvider,
];

/// Parse the occupied intervals out of a list of active bookings.
/// A stored booking with an unparseable time is an error, not a skip —
/// silently dropping it would reopen its slot.
pub(super) fn booked_windows(bookings: &[Booking]) -> Result<Vec<Window>, EngineError> {
    let mut out = Vec::with_capacity(bookings.len());
    for b in bookings {
        out.push(b.window()?);
    }
    out.sort_by_key(|w| w.start);
    Ok(out)
}

/// Half-open overlap check of a candidate interval against active bookings.
/// Returns the id of the first blocking booking as the conflict.
pub(super) fn check_no_conflict(
    bookings: &[Booking],
    candidate: &Window,
) -> Result<(), EngineError> {
    for b in bookings {
        if b.window()?.overlaps(candidate) {
            return Err(EngineError::Conflict(b.id));
        }
    }
    Ok(())
}
