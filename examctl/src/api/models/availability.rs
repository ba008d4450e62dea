//! API models for availability queries.

use crate::db::models::catalog::{Exam, ExamType, Site};
use crate::types::{ExamId, ExamTypeId, SiteId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Query parameter models

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailableDatesQuery {
    /// Earliest date to consider; defaults to today
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailableSitesQuery {
    /// Date to check availability for
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailableExamTypesQuery {
    /// Date to check availability for
    pub date: NaiveDate,
    /// Site to check availability at
    #[param(value_type = String, format = "uuid")]
    #[schema(value_type = String, format = "uuid")]
    pub site_id: SiteId,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailableExamsQuery {
    /// Date to check availability for
    pub date: NaiveDate,
    /// Site to check availability at
    #[param(value_type = String, format = "uuid")]
    #[schema(value_type = String, format = "uuid")]
    pub site_id: SiteId,
    /// Exam category to filter by
    #[param(value_type = String, format = "uuid")]
    #[schema(value_type = String, format = "uuid")]
    pub exam_type_id: ExamTypeId,
}

// Response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SiteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SiteId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamTypeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ExamTypeId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ExamId,
    #[schema(value_type = String, format = "uuid")]
    pub exam_type_id: ExamTypeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
}

// Conversions

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            name: site.name,
            address: site.address,
            city: site.city,
            phone: site.phone,
        }
    }
}

impl From<ExamType> for ExamTypeResponse {
    fn from(exam_type: ExamType) -> Self {
        Self {
            id: exam_type.id,
            name: exam_type.name,
            description: exam_type.description,
        }
    }
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            exam_type_id: exam.exam_type_id,
            name: exam.name,
            description: exam.description,
            preparation: exam.preparation,
        }
    }
}
