//! Database models for the exam catalog: sites, exam categories and the
//! specific exams offered at them. Reference data only - rows are created by
//! administrative seeding, never by the booking flows.

use crate::types::{ExamId, ExamTypeId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A physical examination site.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An exam category (laboratory, imaging, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamType {
    pub id: ExamTypeId,
    pub name: String,
    pub description: Option<String>,
}

/// A specific exam belonging to one category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: ExamId,
    pub exam_type_id: ExamTypeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
}

/// Database request for creating a site
#[derive(Debug, Clone)]
pub struct SiteCreateDBRequest {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

/// Database request for creating an exam type
#[derive(Debug, Clone)]
pub struct ExamTypeCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Database request for creating an exam
#[derive(Debug, Clone)]
pub struct ExamCreateDBRequest {
    pub exam_type_id: ExamTypeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
}
