//! Hard caps on caller-supplied input. Exceeding any of these fails the
//! request with `EngineError::LimitExceeded` before the store is touched.

/// Widest date range a calendar projection may cover (one leap year).
pub const MAX_CALENDAR_DAYS: usize = 366;

/// Longest consumer note / provider note on a booking.
pub const MAX_NOTES_LEN: usize = 2000;

/// Longest cancellation or exception reason.
pub const MAX_REASON_LEN: usize = 500;

/// A single booking can never span more than one day.
pub const MAX_DURATION_HOURS: f64 = 24.0;
