use crate::{
    AppState,
    api::models::{
        appointments::{
            AppointmentCancel, AppointmentCreate, AppointmentDetailResponse, AppointmentResponse,
            ListAppointmentsQuery,
        },
        users::CurrentUser,
    },
    booking::BookingService,
    db::handlers::Appointments,
    errors::{Error, Result},
    types::AppointmentId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// Book an appointment
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    summary = "Book an appointment",
    description = "Book one capacity unit of the slot identified by site, exam and start time \
                   for the authenticated user",
    request_body = AppointmentCreate,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Slot or user not found"),
        (status = 409, description = "No remaining capacity on the slot"),
        (status = 503, description = "Slot busy - lock wait timed out"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_user_header" = [])
    )
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<AppointmentCreate>,
) -> Result<(StatusCode, Json<AppointmentResponse>)> {
    let booking = BookingService::new(state.db.clone(), &state.config.booking);
    let appointment = booking
        .book(current_user.id, data.site_id, data.exam_id, data.scheduled_at)
        .await?;

    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(appointment))))
}

/// List the authenticated user's appointments
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    summary = "List own appointments",
    description = "List the authenticated user's appointments, newest first",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "List of appointments", body = [AppointmentResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_user_header" = [])
    )
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<AppointmentResponse>>> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Appointments::new(&mut conn);

    let appointments = repo.list_for_user(current_user.id, skip, limit).await?;

    Ok(Json(appointments.into_iter().map(AppointmentResponse::from).collect()))
}

/// Get one appointment with its slot, site and exam context
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    summary = "Get an appointment",
    description = "Fetch one of the authenticated user's appointments together with its slot, \
                   site and exam",
    params(
        ("id" = String, Path, description = "Appointment ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Appointment detail", body = AppointmentDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Appointment belongs to another user"),
        (status = 404, description = "Appointment not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_user_header" = [])
    )
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    current_user: CurrentUser,
) -> Result<Json<AppointmentDetailResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Appointments::new(&mut conn);

    let Some(detail) = repo.get_detail(id).await? else {
        return Err(Error::NotFound {
            resource: "appointment".to_string(),
            id: id.to_string(),
        });
    };
    if detail.user_id != current_user.id {
        return Err(Error::Forbidden {
            message: "Appointment belongs to another user".to_string(),
        });
    }

    Ok(Json(AppointmentDetailResponse::from(detail)))
}

/// Cancel an appointment
#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    tag = "appointments",
    summary = "Cancel an appointment",
    description = "Cancel one of the authenticated user's appointments, releasing its capacity \
                   unit back to the slot",
    params(
        ("id" = String, Path, description = "Appointment ID (UUID)"),
    ),
    request_body = AppointmentCancel,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Appointment belongs to another user"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment not in a cancellable state"),
        (status = 503, description = "Slot busy - lock wait timed out"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_user_header" = [])
    )
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    current_user: CurrentUser,
    Json(data): Json<AppointmentCancel>,
) -> Result<Json<AppointmentResponse>> {
    let booking = BookingService::new(state.db.clone(), &state.config.booking);
    let appointment = booking.cancel(current_user.id, id, data.reason).await?;

    Ok(Json(AppointmentResponse::from(appointment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::appointments::AppointmentStatus;
    use crate::test_utils::{
        auth_header, create_test_app, create_test_exam, create_test_site, create_test_slot,
        create_test_user, fill_slot, scheduled_at_for, slot_booked_count,
    };
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn book_appointment_creates_booked_reservation(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 10).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header, value)
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let appointment: AppointmentResponse = response.json();
        assert_eq!(appointment.user_id, user.id);
        assert_eq!(appointment.slot_id, slot.id);
        assert_eq!(appointment.status, AppointmentStatus::Booked);
        assert_eq!(slot_booked_count(&pool, slot.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn book_appointment_requires_authentication(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 10).await;

        let response = server
            .post("/api/v1/appointments")
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn book_appointment_unknown_slot_is_not_found(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header, value)
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": "2030-01-01T09:00:00Z",
            }))
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn book_appointment_full_slot_is_conflict(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 2).await;
        fill_slot(&pool, slot.id).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header, value)
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(slot_booked_count(&pool, slot.id).await, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn cancel_appointment_releases_capacity(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 5).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header.clone(), value.clone())
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let appointment: AppointmentResponse = response.json();
        assert_eq!(slot_booked_count(&pool, slot.id).await, 1);

        let response = server
            .post(&format!("/api/v1/appointments/{}/cancel", appointment.id))
            .add_header(header, value)
            .json(&json!({ "reason": "schedule conflict" }))
            .await;

        response.assert_status_ok();
        let cancelled: AppointmentResponse = response.json();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("schedule conflict"));
        assert_eq!(slot_booked_count(&pool, slot.id).await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn cancel_appointment_twice_is_conflict(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 5).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header.clone(), value.clone())
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;
        let appointment: AppointmentResponse = response.json();

        let response = server
            .post(&format!("/api/v1/appointments/{}/cancel", appointment.id))
            .add_header(header.clone(), value.clone())
            .json(&json!({ "reason": null }))
            .await;
        response.assert_status_ok();

        let response = server
            .post(&format!("/api/v1/appointments/{}/cancel", appointment.id))
            .add_header(header, value)
            .json(&json!({ "reason": null }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(slot_booked_count(&pool, slot.id).await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn cancel_foreign_appointment_is_forbidden(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool).await;
        let intruder = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 5).await;

        let (header, value) = auth_header(&owner);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header, value)
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;
        let appointment: AppointmentResponse = response.json();

        let (header, value) = auth_header(&intruder);
        let response = server
            .post(&format!("/api/v1/appointments/{}/cancel", appointment.id))
            .add_header(header, value)
            .json(&json!({ "reason": "not mine" }))
            .await;

        response.assert_status_forbidden();
        // Capacity still held by the owner's booking
        assert_eq!(slot_booked_count(&pool, slot.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn get_appointment_returns_projected_detail(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 5).await;

        let (header, value) = auth_header(&user);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header.clone(), value.clone())
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;
        let appointment: AppointmentResponse = response.json();

        let response = server
            .get(&format!("/api/v1/appointments/{}", appointment.id))
            .add_header(header, value)
            .await;

        response.assert_status_ok();
        let detail: AppointmentDetailResponse = response.json();
        assert_eq!(detail.id, appointment.id);
        assert_eq!(detail.site_id, site.id);
        assert_eq!(detail.site_name, site.name);
        assert_eq!(detail.exam_id, exam.id);
        assert_eq!(detail.exam_name, exam.name);
        assert_eq!(detail.slot_date, slot.slot_date);
        assert_eq!(detail.start_time, slot.start_time);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn get_foreign_appointment_is_forbidden(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool).await;
        let intruder = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;
        let slot = create_test_slot(&pool, site.id, exam.id, 5).await;

        let (header, value) = auth_header(&owner);
        let response = server
            .post("/api/v1/appointments")
            .add_header(header, value)
            .json(&json!({
                "site_id": site.id,
                "exam_id": exam.id,
                "scheduled_at": scheduled_at_for(&slot),
            }))
            .await;
        let appointment: AppointmentResponse = response.json();

        let (header, value) = auth_header(&intruder);
        let response = server
            .get(&format!("/api/v1/appointments/{}", appointment.id))
            .add_header(header, value)
            .await;
        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn list_appointments_paginates_newest_first(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let site = create_test_site(&pool).await;
        let exam = create_test_exam(&pool).await;

        let (header, value) = auth_header(&user);
        let mut booked_ids = Vec::new();
        for hour in 8..13 {
            let slot = create_test_slot_at(&pool, site.id, exam.id, hour).await;
            let response = server
                .post("/api/v1/appointments")
                .add_header(header.clone(), value.clone())
                .json(&json!({
                    "site_id": site.id,
                    "exam_id": exam.id,
                    "scheduled_at": scheduled_at_for(&slot),
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
            let appointment: AppointmentResponse = response.json();
            booked_ids.push(appointment.id);
        }

        let response = server
            .get("/api/v1/appointments?limit=2")
            .add_header(header.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let page: Vec<AppointmentResponse> = response.json();
        assert_eq!(page.len(), 2);

        let response = server
            .get("/api/v1/appointments?skip=2&limit=10")
            .add_header(header.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let rest: Vec<AppointmentResponse> = response.json();
        assert_eq!(rest.len(), 3);

        // Another user sees nothing
        let other = create_test_user(&pool).await;
        let (header, value) = auth_header(&other);
        let response = server.get("/api/v1/appointments").add_header(header, value).await;
        response.assert_status_ok();
        let empty: Vec<AppointmentResponse> = response.json();
        assert!(empty.is_empty());
    }

    async fn create_test_slot_at(
        pool: &PgPool,
        site_id: crate::types::SiteId,
        exam_id: crate::types::ExamId,
        hour: u32,
    ) -> crate::db::models::slots::Slot {
        use crate::db::models::slots::SlotCreateDBRequest;
        use chrono::{NaiveDate, NaiveTime};

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut slots = crate::db::handlers::Slots::new(&mut conn);
        slots
            .create(&SlotCreateDBRequest {
                site_id,
                exam_id,
                slot_date: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
                capacity: 1,
            })
            .await
            .expect("Failed to create test slot")
    }
}
