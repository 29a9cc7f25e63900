use ulid::Ulid;

use crate::model::BookingStatus;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    /// Requested status change is not a legal lifecycle transition.
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// The requested interval collides with an existing active booking.
    Conflict(Ulid),
    /// Optimistic-concurrency write lost the race twice.
    ConcurrentModification(Ulid),
    /// Transaction status and balance transfer diverged. Always logged at
    /// error severity before being surfaced.
    SettlementInconsistency(Ulid),
    /// Unparseable or inverted "HH:MM" time.
    InvalidTime(String),
    InvalidInput(&'static str),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition: {from:?} -> {to:?}")
            }
            EngineError::Conflict(id) => write!(f, "time slot already booked by: {id}"),
            EngineError::ConcurrentModification(id) => {
                write!(f, "concurrent modification of: {id}")
            }
            EngineError::SettlementInconsistency(id) => {
                write!(f, "settlement inconsistency on transaction: {id}")
            }
            EngineError::InvalidTime(s) => write!(f, "invalid time: {s:?}"),
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
