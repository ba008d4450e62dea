//! Repository for the appointment ledger.
//!
//! Appointment rows are created and updated by at most one transaction each;
//! they need no locking of their own. Capacity consistency comes from the
//! slot row lock held by the booking flows around every write here.

use crate::db::{
    errors::Result,
    models::appointments::{
        AppointmentCreateDBRequest, AppointmentDBResponse, AppointmentDetailDBResponse, AppointmentStatus,
    },
};
use crate::types::{AppointmentId, ExamId, SiteId, SlotId, UserId, abbrev_uuid};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

const APPOINTMENT_COLUMNS: &str =
    "id, user_id, slot_id, scheduled_at, status, cancellation_reason, created_at, updated_at";

// Database entity model for an appointment row
#[derive(Debug, Clone, FromRow)]
struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentDBResponse {
    fn from(row: Appointment) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            slot_id: row.slot_id,
            scheduled_at: row.scheduled_at,
            status: row.status,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Entity model for the appointment-with-slot-and-catalog projection
#[derive(Debug, Clone, FromRow)]
struct AppointmentDetail {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub site_id: SiteId,
    pub site_name: String,
    pub exam_id: ExamId,
    pub exam_name: String,
}

impl From<AppointmentDetail> for AppointmentDetailDBResponse {
    fn from(row: AppointmentDetail) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            slot_id: row.slot_id,
            scheduled_at: row.scheduled_at,
            status: row.status,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            slot_date: row.slot_date,
            start_time: row.start_time,
            end_time: row.end_time,
            site_id: row.site_id,
            site_name: row.site_name,
            exam_id: row.exam_id,
            exam_name: row.exam_name,
        }
    }
}

pub struct Appointments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Appointments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new appointment with status `booked`. Must run in the same
    /// transaction as the slot counter mutation it accounts for.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &AppointmentCreateDBRequest) -> Result<AppointmentDBResponse> {
        let sql = format!(
            "INSERT INTO appointments (user_id, slot_id, scheduled_at, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(request.user_id)
            .bind(request.slot_id)
            .bind(request.scheduled_at)
            .bind(AppointmentStatus::Booked)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(AppointmentDBResponse::from(appointment))
    }

    pub async fn get_by_id(&mut self, id: AppointmentId) -> Result<Option<AppointmentDBResponse>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(appointment.map(AppointmentDBResponse::from))
    }

    /// Appointment joined with its slot, site and exam.
    pub async fn get_detail(&mut self, id: AppointmentId) -> Result<Option<AppointmentDetailDBResponse>> {
        let detail = sqlx::query_as::<_, AppointmentDetail>(
            "SELECT a.id, a.user_id, a.slot_id, a.scheduled_at, a.status, a.cancellation_reason, \
                    a.created_at, a.updated_at, \
                    sl.slot_date, sl.start_time, sl.end_time, \
                    s.id AS site_id, s.name AS site_name, \
                    e.id AS exam_id, e.name AS exam_name \
             FROM appointments a \
             JOIN slots sl ON sl.id = a.slot_id \
             JOIN sites s ON s.id = sl.site_id \
             JOIN exams e ON e.id = sl.exam_id \
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(detail.map(AppointmentDetailDBResponse::from))
    }

    /// List a user's appointments, newest first, with pagination.
    pub async fn list_for_user(
        &mut self,
        user_id: UserId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<AppointmentDBResponse>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             OFFSET $2 LIMIT $3"
        );
        let appointments = sqlx::query_as::<_, Appointment>(&sql)
            .bind(user_id)
            .bind(skip)
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(appointments.into_iter().map(AppointmentDBResponse::from).collect())
    }

    /// Transition an appointment to `cancelled`, storing the reason.
    #[instrument(skip(self, reason), fields(appointment_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_cancelled(
        &mut self,
        id: AppointmentId,
        reason: Option<&str>,
    ) -> Result<AppointmentDBResponse> {
        let sql = format!(
            "UPDATE appointments \
             SET status = $2, cancellation_reason = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .bind(AppointmentStatus::Cancelled)
            .bind(reason)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(AppointmentDBResponse::from(appointment))
    }
}
