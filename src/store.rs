use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::*;

/// The persistence collaborator. The engine never reaches for an ambient
/// client — an implementation of this trait is injected at construction.
///
/// Every method is a suspending call; the engine's own computation between
/// calls is synchronous. Wire formats (ISO dates, "HH:MM" times, 0=Sunday
/// weekdays) are carried in the model types unchanged.
#[async_trait]
pub trait ScheduleStore: Send + Sync + 'static {
    async fn get_service(&self, id: Ulid) -> Result<Service, EngineError>;

    /// Schedules for a service, optionally filtered to one weekday.
    async fn list_schedules(
        &self,
        service_id: Ulid,
        day_of_week: Option<u8>,
        active_only: bool,
    ) -> Result<Vec<ServiceSchedule>, EngineError>;

    async fn list_exceptions(
        &self,
        service_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, EngineError>;

    /// Bookings for a service on a date, minus the excluded statuses.
    async fn list_bookings(
        &self,
        service_id: Ulid,
        date: NaiveDate,
        exclude: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError>;

    async fn create_booking(&self, booking: Booking) -> Result<Booking, EngineError>;

    async fn get_booking(&self, id: Ulid) -> Result<Booking, EngineError>;

    /// Conditional booking write: fails with `ConcurrentModification` when
    /// the stored version no longer matches `booking.version`. The stored
    /// version is bumped on success.
    async fn update_booking(&self, booking: Booking) -> Result<Booking, EngineError>;

    async fn get_user(&self, id: Ulid) -> Result<User, EngineError>;

    /// Conditional balance write: fails with `ConcurrentModification` when
    /// the stored version no longer matches `expected_version`. The new
    /// balance is floored at zero.
    async fn update_user_balance(
        &self,
        user_id: Ulid,
        delta: f64,
        expected_version: u64,
    ) -> Result<User, EngineError>;

    async fn get_transaction(&self, id: Ulid) -> Result<Transaction, EngineError>;

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, EngineError>;

    // Provider-scoped lookups for the calendar projection.

    async fn list_provider_schedules(
        &self,
        provider_id: Ulid,
        day_of_week: Option<u8>,
        active_only: bool,
    ) -> Result<Vec<ServiceSchedule>, EngineError>;

    async fn list_provider_exceptions(
        &self,
        provider_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, EngineError>;

    async fn list_provider_bookings(
        &self,
        provider_id: Ulid,
        date: NaiveDate,
        exclude: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError>;
}

/// In-memory `ScheduleStore` over concurrent maps. Reference implementation
/// and the store every test runs against.
#[derive(Default)]
pub struct MemoryStore {
    services: DashMap<Ulid, Service>,
    schedules: DashMap<Ulid, ServiceSchedule>,
    exceptions: DashMap<Ulid, ScheduleException>,
    bookings: DashMap<Ulid, Booking>,
    users: DashMap<Ulid, User>,
    transactions: DashMap<Ulid, Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers — upsert by id.

    pub fn put_service(&self, service: Service) {
        self.services.insert(service.id, service);
    }

    pub fn put_schedule(&self, schedule: ServiceSchedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    pub fn put_exception(&self, exception: ScheduleException) {
        self.exceptions.insert(exception.id, exception);
    }

    pub fn put_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn put_transaction(&self, tx: Transaction) {
        self.transactions.insert(tx.id, tx);
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get_service(&self, id: Ulid) -> Result<Service, EngineError> {
        self.services
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn list_schedules(
        &self,
        service_id: Ulid,
        day_of_week: Option<u8>,
        active_only: bool,
    ) -> Result<Vec<ServiceSchedule>, EngineError> {
        let mut out: Vec<ServiceSchedule> = self
            .schedules
            .iter()
            .filter(|e| e.service_id == service_id)
            .filter(|e| day_of_week.is_none_or(|d| e.day_of_week == d))
            .filter(|e| !active_only || e.is_active)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn list_exceptions(
        &self,
        service_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, EngineError> {
        Ok(self
            .exceptions
            .iter()
            .filter(|e| e.service_id == service_id && e.exception_date == date)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn list_bookings(
        &self,
        service_id: Ulid,
        date: NaiveDate,
        exclude: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError> {
        let mut out: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| e.service_id == service_id && e.booking_date == date)
            .filter(|e| !exclude.contains(&e.status))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, EngineError> {
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.bookings
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn update_booking(&self, mut booking: Booking) -> Result<Booking, EngineError> {
        let mut entry = self
            .bookings
            .get_mut(&booking.id)
            .ok_or(EngineError::NotFound(booking.id))?;
        if entry.version != booking.version {
            return Err(EngineError::ConcurrentModification(booking.id));
        }
        booking.version += 1;
        *entry = booking.clone();
        Ok(booking)
    }

    async fn get_user(&self, id: Ulid) -> Result<User, EngineError> {
        self.users
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn update_user_balance(
        &self,
        user_id: Ulid,
        delta: f64,
        expected_version: u64,
    ) -> Result<User, EngineError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or(EngineError::NotFound(user_id))?;
        if entry.version != expected_version {
            return Err(EngineError::ConcurrentModification(user_id));
        }
        entry.bank_hours = (entry.bank_hours + delta).max(0.0);
        entry.version += 1;
        Ok(entry.value().clone())
    }

    async fn get_transaction(&self, id: Ulid) -> Result<Transaction, EngineError> {
        self.transactions
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, EngineError> {
        if !self.transactions.contains_key(&tx.id) {
            return Err(EngineError::NotFound(tx.id));
        }
        self.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn list_provider_schedules(
        &self,
        provider_id: Ulid,
        day_of_week: Option<u8>,
        active_only: bool,
    ) -> Result<Vec<ServiceSchedule>, EngineError> {
        let mut out: Vec<ServiceSchedule> = self
            .schedules
            .iter()
            .filter(|e| e.provider_id == provider_id)
            .filter(|e| day_of_week.is_none_or(|d| e.day_of_week == d))
            .filter(|e| !active_only || e.is_active)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn list_provider_exceptions(
        &self,
        provider_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, EngineError> {
        Ok(self
            .exceptions
            .iter()
            .filter(|e| e.provider_id == provider_id && e.exception_date == date)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn list_provider_bookings(
        &self,
        provider_id: Ulid,
        date: NaiveDate,
        exclude: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError> {
        let mut out: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| e.provider_id == provider_id && e.booking_date == date)
            .filter(|e| !exclude.contains(&e.status))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }
}
