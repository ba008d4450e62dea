//! API models for appointments.

use crate::db::models::appointments::{
    AppointmentDBResponse, AppointmentDetailDBResponse, AppointmentStatus,
};
use crate::types::{AppointmentId, ExamId, SiteId, SlotId, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Request models

/// Request body for booking an appointment. The requester comes from the
/// authentication layer, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentCreate {
    /// Site where the exam takes place
    #[schema(value_type = String, format = "uuid")]
    pub site_id: SiteId,
    /// Exam to book
    #[schema(value_type = String, format = "uuid")]
    pub exam_id: ExamId,
    /// Start of the targeted slot (UTC, RFC 3339)
    pub scheduled_at: DateTime<Utc>,
}

/// Request body for cancelling an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentCancel {
    /// Why the appointment is being cancelled
    pub reason: Option<String>,
}

// Response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AppointmentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment together with its slot, site and exam context.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentDetailResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AppointmentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[schema(value_type = String, format = "uuid")]
    pub site_id: SiteId,
    pub site_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub exam_id: ExamId,
    pub exam_name: String,
}

/// Query parameters for listing appointments
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListAppointmentsQuery {
    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

// Conversions

impl From<AppointmentDBResponse> for AppointmentResponse {
    fn from(db: AppointmentDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            slot_id: db.slot_id,
            scheduled_at: db.scheduled_at,
            status: db.status,
            cancellation_reason: db.cancellation_reason,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<AppointmentDetailDBResponse> for AppointmentDetailResponse {
    fn from(db: AppointmentDetailDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            slot_id: db.slot_id,
            scheduled_at: db.scheduled_at,
            status: db.status,
            cancellation_reason: db.cancellation_reason,
            created_at: db.created_at,
            updated_at: db.updated_at,
            slot_date: db.slot_date,
            start_time: db.start_time,
            end_time: db.end_time,
            site_id: db.site_id,
            site_name: db.site_name,
            exam_id: db.exam_id,
            exam_name: db.exam_name,
        }
    }
}
