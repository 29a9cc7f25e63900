use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use ulid::Ulid;

use crate::limits::{MAX_NOTES_LEN, MAX_REASON_LEN};
use crate::model::*;
use crate::observability;
use crate::store::ScheduleStore;

use super::conflict::{CONFLICT_EXCLUDED, check_no_conflict};
use super::slots::hours_to_minutes;
use super::{Engine, EngineError};

/// Consumer request to reserve a service interval.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub service_id: Ulid,
    pub consumer_id: Ulid,
    pub booking_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    /// Hours; must match the requested interval length.
    pub duration: f64,
    pub notes: Option<String>,
}

/// Optional fields carried by a status update.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    pub provider_notes: Option<String>,
    pub cancellation_reason: Option<String>,
}

impl<S: ScheduleStore> Engine<S> {
    /// Create a PENDING booking, re-validating the interval against active
    /// bookings at write time. The check-then-insert runs under a
    /// per-service lock so two concurrent overlapping requests cannot
    /// both pass.
    pub async fn create_booking(&self, req: BookingRequest) -> Result<Booking, EngineError> {
        let window = Window::parse(&req.start_time, &req.end_time)?;
        let duration_min = hours_to_minutes(req.duration)?;
        if window.duration_min() != duration_min {
            return Err(EngineError::InvalidInput("duration does not match interval"));
        }
        if let Some(ref n) = req.notes
            && n.len() > MAX_NOTES_LEN
        {
            return Err(EngineError::LimitExceeded("notes too long"));
        }

        let service = self.store().get_service(req.service_id).await?;
        if !service.requires_scheduling {
            // caller responsibility, not a hard failure
            warn!(service = %service.id, "booking created for non-scheduled service");
        }
        if let Some(min) = service.min_booking_hours
            && req.duration < min
        {
            return Err(EngineError::InvalidInput("duration below service minimum"));
        }
        if let Some(max) = service.max_booking_hours
            && req.duration > max
        {
            return Err(EngineError::InvalidInput("duration above service maximum"));
        }

        let lock = self.booking_lock(req.service_id);
        let _guard = lock.lock().await;

        let existing = self
            .store()
            .list_bookings(req.service_id, req.booking_date, CONFLICT_EXCLUDED)
            .await?;
        if let Err(e) = check_no_conflict(&existing, &window) {
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        let now = Utc::now();
        let booking = Booking {
            id: Ulid::new(),
            service_id: service.id,
            provider_id: service.provider_id,
            consumer_id: req.consumer_id,
            booking_date: req.booking_date,
            start_time: req.start_time,
            end_time: req.end_time,
            duration: req.duration,
            total_cost: req.duration * service.hourly_rate,
            status: BookingStatus::Pending,
            notes: req.notes,
            provider_notes: None,
            cancellation_reason: None,
            created_at: now,
            confirmed_at: None,
            cancelled_at: None,
            completed_at: None,
            updated_at: now,
            version: 0,
        };
        let created = self.store().create_booking(booking).await?;
        info!(
            booking = %created.id,
            service = %created.service_id,
            date = %created.booking_date,
            interval = %format_args!("{}-{}", created.start_time, created.end_time),
            "booking created"
        );
        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(created)
    }

    /// Drive a booking through the lifecycle state machine. Illegal
    /// transitions (including any move out of a terminal state) fail with
    /// `InvalidTransition`; legal ones set the matching timestamp.
    ///
    /// The write is conditional on the booking's version. On a version
    /// conflict the read and the FSM check are rerun exactly once against
    /// fresh state — a racing update that reached a terminal state first
    /// turns this call into `InvalidTransition`, never an overwrite.
    pub async fn update_booking_status(
        &self,
        id: Ulid,
        new_status: BookingStatus,
        change: StatusChange,
    ) -> Result<Booking, EngineError> {
        if let Some(ref n) = change.provider_notes
            && n.len() > MAX_NOTES_LEN
        {
            return Err(EngineError::LimitExceeded("provider notes too long"));
        }
        if let Some(ref r) = change.cancellation_reason
            && r.len() > MAX_REASON_LEN
        {
            return Err(EngineError::LimitExceeded("cancellation reason too long"));
        }

        let mut retried = false;
        let updated = loop {
            let mut booking = self.store().get_booking(id).await?;
            if !booking.status.can_transition_to(new_status) {
                metrics::counter!(observability::INVALID_TRANSITIONS_TOTAL).increment(1);
                return Err(EngineError::InvalidTransition {
                    from: booking.status,
                    to: new_status,
                });
            }

            let now = Utc::now();
            match new_status {
                BookingStatus::Confirmed => booking.confirmed_at = Some(now),
                BookingStatus::CancelledByConsumer | BookingStatus::CancelledByProvider => {
                    booking.cancelled_at = Some(now)
                }
                BookingStatus::Completed => booking.completed_at = Some(now),
                BookingStatus::InProgress
                | BookingStatus::NoShowConsumer
                | BookingStatus::NoShowProvider
                | BookingStatus::Pending => {}
            }
            booking.status = new_status;
            booking.updated_at = now;
            if change.provider_notes.is_some() {
                booking.provider_notes = change.provider_notes.clone();
            }
            if change.cancellation_reason.is_some() {
                booking.cancellation_reason = change.cancellation_reason.clone();
            }

            match self.store().update_booking(booking).await {
                Ok(b) => break b,
                Err(EngineError::ConcurrentModification(_)) if !retried => {
                    retried = true;
                    warn!(booking = %id, "booking version conflict, retrying once");
                }
                Err(e) => return Err(e),
            }
        };
        info!(
            booking = %updated.id,
            status = observability::status_label(updated.status),
            "booking status updated"
        );
        metrics::counter!(
            observability::STATUS_TRANSITIONS_TOTAL,
            "to" => observability::status_label(updated.status)
        )
        .increment(1);
        Ok(updated)
    }
}
