//! OpenAPI documentation for the `/api/v1` surface, served at `/docs`.

use crate::api::models::{
    appointments::{
        AppointmentCancel, AppointmentCreate, AppointmentDetailResponse, AppointmentResponse,
    },
    availability::{ExamResponse, ExamTypeResponse, SiteResponse},
};
use crate::db::models::appointments::AppointmentStatus;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "examctl API",
        description = "Capacity-safe booking of medical exam time slots"
    ),
    paths(
        crate::api::handlers::appointments::book_appointment,
        crate::api::handlers::appointments::list_appointments,
        crate::api::handlers::appointments::get_appointment,
        crate::api::handlers::appointments::cancel_appointment,
        crate::api::handlers::availability::available_dates,
        crate::api::handlers::availability::available_sites,
        crate::api::handlers::availability::available_exam_types,
        crate::api::handlers::availability::available_exams,
    ),
    components(schemas(
        AppointmentCreate,
        AppointmentCancel,
        AppointmentResponse,
        AppointmentDetailResponse,
        AppointmentStatus,
        SiteResponse,
        ExamTypeResponse,
        ExamResponse,
    )),
    tags(
        (name = "appointments", description = "Booking and cancellation"),
        (name = "availability", description = "Read-only remaining-capacity queries"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the trusted proxy header as the API's security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "proxy_user_header",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-examctl-user"))),
            );
        }
    }
}
