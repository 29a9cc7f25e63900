mod calendar;
mod conflict;
mod error;
mod lifecycle;
mod settlement;
mod slots;

pub use error::EngineError;
pub use lifecycle::{BookingRequest, StatusChange};
pub use slots::{SLOT_STEP_MIN, resolve_windows, scan_windows};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::store::ScheduleStore;

/// The Availability & Booking Engine. Stateless apart from the per-service
/// lock registry — all durable state lives behind the injected store.
pub struct Engine<S: ScheduleStore> {
    store: S,
    /// Per-service serialization point for booking creation. Ensures the
    /// read-validate-write sequence in `create_booking` is single-writer
    /// per service within this process. Entries are never evicted: the
    /// registry holds one small entry per distinct service booked over the
    /// process lifetime.
    booking_locks: DashMap<Ulid, Arc<Mutex<()>>>,
}

impl<S: ScheduleStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            booking_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(super) fn booking_lock(&self, service_id: Ulid) -> Arc<Mutex<()>> {
        self.booking_locks
            .entry(service_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
