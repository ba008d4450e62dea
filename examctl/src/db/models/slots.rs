//! Database models for bookable exam slots.
//!
//! A slot is one (site, exam, date, time-range) unit with a finite capacity.
//! `booked_count` is derived state kept consistent with the number of active
//! appointments against the slot; keeping it consistent under concurrency is
//! the job of [`crate::db::handlers::slots::Slots`] and
//! [`crate::booking::BookingService`], which only move the counter while
//! holding the slot's row lock.

use crate::types::{ExamId, SiteId, SlotId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Natural identity of a slot: where, what, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotKey {
    pub site_id: SiteId,
    pub exam_id: ExamId,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
}

impl SlotKey {
    /// Derive the slot key targeted by a booking request. Slots are keyed by
    /// the UTC date and wall-clock start time of the requested moment.
    pub fn for_booking(site_id: SiteId, exam_id: ExamId, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            site_id,
            exam_id,
            slot_date: scheduled_at.date_naive(),
            start_time: scheduled_at.time(),
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} {} {}",
            self.site_id, self.exam_id, self.slot_date, self.start_time
        )
    }
}

/// One slot row. Counter invariant: `0 <= booked_count <= capacity`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Slot {
    pub id: SlotId,
    pub site_id: SiteId,
    pub exam_id: ExamId,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub booked_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    pub fn remaining_capacity(&self) -> i32 {
        self.capacity - self.booked_count
    }

    pub fn has_free_capacity(&self) -> bool {
        self.booked_count < self.capacity
    }

    /// Claim one unit of capacity.
    ///
    /// Callers must hold the slot's row lock and have already verified free
    /// capacity; the guard here catches accounting bugs, not races. A
    /// [`CapacityError::WouldExceed`] therefore signals a data-consistency
    /// defect, not a full slot.
    pub fn occupy(&mut self) -> Result<(), CapacityError> {
        if !self.has_free_capacity() {
            return Err(CapacityError::WouldExceed {
                slot_id: self.id,
                capacity: self.capacity,
            });
        }
        self.booked_count += 1;
        Ok(())
    }

    /// Return one previously claimed unit of capacity.
    pub fn release(&mut self) -> Result<(), CapacityError> {
        if self.booked_count == 0 {
            return Err(CapacityError::WouldUnderflow { slot_id: self.id });
        }
        self.booked_count -= 1;
        Ok(())
    }
}

/// Capacity accounting violation. Either variant means the counter and the
/// ledger have diverged somewhere.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("slot {slot_id}: booked count would exceed capacity {capacity}")]
    WouldExceed { slot_id: SlotId, capacity: i32 },

    #[error("slot {slot_id}: booked count would fall below zero")]
    WouldUnderflow { slot_id: SlotId },
}

/// Database request for creating a slot (administrative/seed path).
#[derive(Debug, Clone)]
pub struct SlotCreateDBRequest {
    pub site_id: SiteId,
    pub exam_id: ExamId,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn slot(capacity: i32, booked_count: i32) -> Slot {
        let now = Utc::now();
        Slot {
            id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            slot_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            capacity,
            booked_count,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn occupy_increments_until_capacity() {
        let mut s = slot(2, 0);
        assert!(s.occupy().is_ok());
        assert!(s.occupy().is_ok());
        assert_eq!(s.booked_count, 2);
        assert!(!s.has_free_capacity());
        assert_eq!(
            s.occupy(),
            Err(CapacityError::WouldExceed {
                slot_id: s.id,
                capacity: 2
            })
        );
        assert_eq!(s.booked_count, 2);
    }

    #[test]
    fn release_decrements_and_guards_underflow() {
        let mut s = slot(2, 1);
        assert!(s.release().is_ok());
        assert_eq!(s.booked_count, 0);
        assert_eq!(s.release(), Err(CapacityError::WouldUnderflow { slot_id: s.id }));
    }

    #[test]
    fn occupy_release_round_trip_restores_remaining_capacity() {
        let mut s = slot(10, 9);
        assert_eq!(s.remaining_capacity(), 1);
        s.occupy().unwrap();
        assert_eq!(s.remaining_capacity(), 0);
        s.release().unwrap();
        assert_eq!(s.remaining_capacity(), 1);
    }

    #[test]
    fn zero_capacity_slot_never_has_free_capacity() {
        let mut s = slot(0, 0);
        assert!(!s.has_free_capacity());
        assert!(s.occupy().is_err());
    }
}
