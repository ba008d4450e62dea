//! Database models for the appointment ledger.

use crate::types::{AppointmentId, ExamId, SiteId, SlotId, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Appointment lifecycle state, stored as TEXT in the database.
///
/// `Pending` is a pre-confirmation state that external flows may stage before
/// a booking is confirmed; the booking flow itself always creates `Booked`.
/// `Completed` is terminal and set by out-of-scope scheduling logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Booked,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// States a requester may still cancel out of.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Booked)
    }
}

/// Database request for creating a new appointment
#[derive(Debug, Clone)]
pub struct AppointmentCreateDBRequest {
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
}

/// Database response for an appointment record
#[derive(Debug, Clone)]
pub struct AppointmentDBResponse {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment projected together with its slot, site and exam. Read-only
/// convenience navigation - the joined columns are never stored on the
/// appointment itself.
#[derive(Debug, Clone)]
pub struct AppointmentDetailDBResponse {
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
