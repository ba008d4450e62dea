//! Booking orchestration: the transactional book and cancel flows.
//!
//! Each operation runs in a single database transaction. The slot row is
//! locked with `SELECT ... FOR UPDATE` before its counter moves, so
//! concurrent operations on the same slot serialize at the database and the
//! booked count can never pass the slot's capacity - across any number of
//! service replicas, since the lock lives in PostgreSQL rather than in
//! process memory. If anything fails after the lock is taken, the lock and
//! all partial writes roll back together.
//!
//! The service deliberately never retries: a lock-wait timeout surfaces as a
//! distinct busy failure and retry policy is the caller's concern.

use crate::config::BookingConfig;
use crate::db::{
    errors::DbError,
    handlers::{Appointments, Slots, Users},
    models::{
        appointments::{AppointmentCreateDBRequest, AppointmentDBResponse},
        slots::SlotKey,
    },
};
use crate::errors::{Error, Result};
use crate::types::{AppointmentId, ExamId, SiteId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::instrument;

#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
    lock_wait_timeout: Duration,
}

impl BookingService {
    pub fn new(db: PgPool, config: &BookingConfig) -> Self {
        Self {
            db,
            lock_wait_timeout: config.lock_wait_timeout,
        }
    }

    /// Book one capacity unit of the slot identified by (site, exam, start
    /// time) for the requester.
    ///
    /// The requester is validated before any lock is taken so that doomed
    /// requests never hold up the slot row.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&requester_id)), err)]
    pub async fn book(
        &self,
        requester_id: UserId,
        site_id: SiteId,
        exam_id: ExamId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<AppointmentDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;

        let mut users = Users::new(&mut tx);
        if !users.exists(requester_id).await? {
            return Err(Error::NotFound {
                resource: "user".to_string(),
                id: requester_id.to_string(),
            });
        }

        let key = SlotKey::for_booking(site_id, exam_id, scheduled_at);
        let mut slots = Slots::new(&mut tx);
        slots.set_lock_timeout(self.lock_wait_timeout).await?;
        let Some(mut slot) = slots.lock_by_key(&key).await? else {
            return Err(Error::NotFound {
                resource: "slot".to_string(),
                id: key.to_string(),
            });
        };
        if !slot.has_free_capacity() {
            return Err(Error::NoCapacity { slot_id: slot.id });
        }
        slot.occupy()?;
        let slot = slots.update_booked_count(&slot).await?;

        let mut appointments = Appointments::new(&mut tx);
        let appointment = appointments
            .create(&AppointmentCreateDBRequest {
                user_id: requester_id,
                slot_id: slot.id,
                scheduled_at,
            })
            .await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(appointment)
    }

    /// Cancel an appointment owned by the requester, releasing its capacity
    /// unit back to the slot.
    #[instrument(
        skip(self, reason),
        fields(user_id = %abbrev_uuid(&requester_id), appointment_id = %abbrev_uuid(&appointment_id)),
        err
    )]
    pub async fn cancel(
        &self,
        requester_id: UserId,
        appointment_id: AppointmentId,
        reason: Option<String>,
    ) -> Result<AppointmentDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;

        let mut appointments = Appointments::new(&mut tx);
        let Some(appointment) = appointments.get_by_id(appointment_id).await? else {
            return Err(Error::NotFound {
                resource: "appointment".to_string(),
                id: appointment_id.to_string(),
            });
        };
        if appointment.user_id != requester_id {
            return Err(Error::Forbidden {
                message: "Appointment belongs to another user".to_string(),
            });
        }
        if !appointment.status.is_cancellable() {
            return Err(Error::InvalidState {
                appointment_id,
                status: appointment.status,
            });
        }

        // Lock via the appointment's own slot reference; never re-derive the
        // natural key from the appointment timestamp.
        let mut slots = Slots::new(&mut tx);
        slots.set_lock_timeout(self.lock_wait_timeout).await?;
        let mut slot = slots
            .lock_by_id(appointment.slot_id)
            .await?
            .ok_or_else(|| Error::Internal {
                operation: format!("load slot {} for cancellation", abbrev_uuid(&appointment.slot_id)),
            })?;
        slot.release()?;
        slots.update_booked_count(&slot).await?;

        let mut appointments = Appointments::new(&mut tx);
        let cancelled = appointments.mark_cancelled(appointment_id, reason.as_deref()).await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(cancelled)
    }
}
