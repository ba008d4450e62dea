//! Repository for slot capacity control and availability queries.
//!
//! This is the only code path that touches `slots.booked_count`. Mutations go
//! through three steps inside the caller's transaction:
//!
//! 1. [`Slots::lock_by_key`] / [`Slots::lock_by_id`] take an exclusive row
//!    lock (`SELECT ... FOR UPDATE`) on the single targeted slot. Other
//!    transactions trying to lock the same slot block here until this
//!    transaction commits or rolls back; unrelated slots are unaffected.
//! 2. The caller checks and moves the counter on the returned
//!    [`Slot`] via its `occupy`/`release` accounting guards.
//! 3. [`Slots::update_booked_count`] persists the new counter.
//!
//! [`Slots::set_lock_timeout`] bounds step 1 so a stuck lock holder cannot
//! block a request indefinitely; PostgreSQL reports the expiry as SQLSTATE
//! 55P03 which surfaces as [`DbError::LockTimeout`].
//!
//! The availability queries are plain reads and never lock.

use crate::db::{
    errors::Result,
    models::{
        catalog::{Exam, ExamType, Site},
        slots::{Slot, SlotCreateDBRequest, SlotKey},
    },
};
use crate::types::{ExamTypeId, SiteId, SlotId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::PgConnection;
use std::time::Duration;
use tracing::instrument;

const SLOT_COLUMNS: &str =
    "id, site_id, exam_id, slot_date, start_time, end_time, capacity, booked_count, created_at, updated_at";

pub struct Slots<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Slots<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Bound how long the current transaction may wait for a slot row lock.
    ///
    /// Uses `set_config(..., is_local = true)`, so the setting dies with the
    /// transaction and never leaks into pooled connections.
    pub async fn set_lock_timeout(&mut self, timeout: Duration) -> Result<()> {
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", timeout.as_millis()))
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    /// Lock the slot matching the natural key, returning it regardless of
    /// remaining capacity. `None` means no such slot exists.
    #[instrument(skip(self), fields(slot_key = %key), err)]
    pub async fn lock_by_key(&mut self, key: &SlotKey) -> Result<Option<Slot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM slots \
             WHERE site_id = $1 AND exam_id = $2 AND slot_date = $3 AND start_time = $4 \
             FOR UPDATE"
        );
        let slot = sqlx::query_as::<_, Slot>(&sql)
            .bind(key.site_id)
            .bind(key.exam_id)
            .bind(key.slot_date)
            .bind(key.start_time)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(slot)
    }

    /// Lock a slot by its surrogate id. Used by cancellation, which must key
    /// on the appointment's own slot reference rather than re-deriving the
    /// natural key from timestamps.
    #[instrument(skip(self), fields(slot_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_by_id(&mut self, id: SlotId) -> Result<Option<Slot>> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1 FOR UPDATE");
        let slot = sqlx::query_as::<_, Slot>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(slot)
    }

    /// Persist a mutated booked count. The caller must still hold the row
    /// lock for the slot, i.e. this runs in the same transaction as the
    /// preceding `lock_by_*` call.
    #[instrument(skip(self, slot), fields(slot_id = %abbrev_uuid(&slot.id), booked_count = slot.booked_count), err)]
    pub async fn update_booked_count(&mut self, slot: &Slot) -> Result<Slot> {
        let sql = format!(
            "UPDATE slots SET booked_count = $2, updated_at = NOW() WHERE id = $1 RETURNING {SLOT_COLUMNS}"
        );
        let slot = sqlx::query_as::<_, Slot>(&sql)
            .bind(slot.id)
            .bind(slot.booked_count)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(slot)
    }

    /// Fetch a slot without locking (read paths only).
    pub async fn get_by_id(&mut self, id: SlotId) -> Result<Option<Slot>> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1");
        let slot = sqlx::query_as::<_, Slot>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(slot)
    }

    /// Create a slot. Administrative/seed path - the booking flows never
    /// create slots.
    #[instrument(skip(self, request), fields(slot_date = %request.slot_date), err)]
    pub async fn create(&mut self, request: &SlotCreateDBRequest) -> Result<Slot> {
        let sql = format!(
            "INSERT INTO slots (site_id, exam_id, slot_date, start_time, end_time, capacity) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SLOT_COLUMNS}"
        );
        let slot = sqlx::query_as::<_, Slot>(&sql)
            .bind(request.site_id)
            .bind(request.exam_id)
            .bind(request.slot_date)
            .bind(request.start_time)
            .bind(request.end_time)
            .bind(request.capacity)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(slot)
    }

    /// Distinct future dates with at least one free unit, ascending.
    pub async fn available_dates(&mut self, from: NaiveDate) -> Result<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT DISTINCT slot_date FROM slots \
             WHERE slot_date >= $1 AND booked_count < capacity \
             ORDER BY slot_date ASC",
        )
        .bind(from)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(dates)
    }

    /// Sites with at least one free unit on the given date.
    pub async fn available_sites(&mut self, date: NaiveDate) -> Result<Vec<Site>> {
        let sites = sqlx::query_as::<_, Site>(
            "SELECT DISTINCT s.id, s.name, s.address, s.city, s.phone, s.created_at \
             FROM sites s \
             JOIN slots sl ON sl.site_id = s.id \
             WHERE sl.slot_date = $1 AND sl.booked_count < sl.capacity \
             ORDER BY s.name",
        )
        .bind(date)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(sites)
    }

    /// Exam categories with at least one free unit on the given date and site.
    pub async fn available_exam_types(&mut self, date: NaiveDate, site_id: SiteId) -> Result<Vec<ExamType>> {
        let exam_types = sqlx::query_as::<_, ExamType>(
            "SELECT DISTINCT t.id, t.name, t.description \
             FROM exam_types t \
             JOIN exams e ON e.exam_type_id = t.id \
             JOIN slots sl ON sl.exam_id = e.id \
             WHERE sl.slot_date = $1 AND sl.site_id = $2 AND sl.booked_count < sl.capacity \
             ORDER BY t.name",
        )
        .bind(date)
        .bind(site_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(exam_types)
    }

    /// Specific exams with at least one free unit for date, site and category.
    pub async fn available_exams(
        &mut self,
        date: NaiveDate,
        site_id: SiteId,
        exam_type_id: ExamTypeId,
    ) -> Result<Vec<Exam>> {
        let exams = sqlx::query_as::<_, Exam>(
            "SELECT DISTINCT e.id, e.exam_type_id, e.name, e.description, e.preparation \
             FROM exams e \
             JOIN slots sl ON sl.exam_id = e.id \
             WHERE sl.slot_date = $1 AND sl.site_id = $2 AND e.exam_type_id = $3 \
               AND sl.booked_count < sl.capacity \
             ORDER BY e.name",
        )
        .bind(date)
        .bind(site_id)
        .bind(exam_type_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(exams)
    }
}
