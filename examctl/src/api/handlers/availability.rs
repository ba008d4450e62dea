use crate::{
    AppState,
    api::models::availability::{
        AvailableDatesQuery, AvailableExamTypesQuery, AvailableExamsQuery, AvailableSitesQuery,
        ExamResponse, ExamTypeResponse, SiteResponse,
    },
    db::handlers::Slots,
    errors::{Error, Result},
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};

/// Dates with remaining capacity
#[utoipa::path(
    get,
    path = "/availability/dates",
    tag = "availability",
    summary = "List dates with remaining capacity",
    description = "Distinct future dates on which at least one slot still has free capacity, \
                   ascending",
    params(AvailableDatesQuery),
    responses(
        (status = 200, description = "Available dates", body = [NaiveDate]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn available_dates(
    State(state): State<AppState>,
    Query(query): Query<AvailableDatesQuery>,
) -> Result<Json<Vec<NaiveDate>>> {
    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Slots::new(&mut conn);

    let dates = repo.available_dates(from).await?;
    Ok(Json(dates))
}

/// Sites with remaining capacity on a date
#[utoipa::path(
    get,
    path = "/availability/sites",
    tag = "availability",
    summary = "List sites with remaining capacity",
    params(AvailableSitesQuery),
    responses(
        (status = 200, description = "Available sites", body = [SiteResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn available_sites(
    State(state): State<AppState>,
    Query(query): Query<AvailableSitesQuery>,
) -> Result<Json<Vec<SiteResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Slots::new(&mut conn);

    let sites = repo.available_sites(query.date).await?;
    Ok(Json(sites.into_iter().map(SiteResponse::from).collect()))
}

/// Exam categories with remaining capacity on a date and site
#[utoipa::path(
    get,
    path = "/availability/exam-types",
    tag = "availability",
    summary = "List exam categories with remaining capacity",
    params(AvailableExamTypesQuery),
    responses(
        (status = 200, description = "Available exam categories", body = [ExamTypeResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn available_exam_types(
    State(state): State<AppState>,
    Query(query): Query<AvailableExamTypesQuery>,
) -> Result<Json<Vec<ExamTypeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Slots::new(&mut conn);

    let exam_types = repo.available_exam_types(query.date, query.site_id).await?;
    Ok(Json(exam_types.into_iter().map(ExamTypeResponse::from).collect()))
}

/// Specific exams with remaining capacity for date, site and category
#[utoipa::path(
    get,
    path = "/availability/exams",
    tag = "availability",
    summary = "List exams with remaining capacity",
    params(AvailableExamsQuery),
    responses(
        (status = 200, description = "Available exams", body = [ExamResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn available_exams(
    State(state): State<AppState>,
    Query(query): Query<AvailableExamsQuery>,
) -> Result<Json<Vec<ExamResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Slots::new(&mut conn);

    let exams = repo
        .available_exams(query.date, query.site_id, query.exam_type_id)
        .await?;
    Ok(Json(exams.into_iter().map(ExamResponse::from).collect()))
}
