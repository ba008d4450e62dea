//! Test utilities for integration testing (available with `test-utils` feature).

use crate::config::Config;
use crate::db::{
    handlers::{Slots, Users},
    models::{
        catalog::{Exam, ExamType, Site},
        slots::{Slot, SlotCreateDBRequest},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::types::{ExamId, ExamTypeId, SiteId, SlotId};
use axum_test::TestServer;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();
    let state = crate::AppState::builder().db(pool).config(config).build();
    let router = crate::build_router(state);
    TestServer::new(router).expect("Failed to create test server")
}

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    // Unknown users in tests are an error, not an onboarding event
    config.auth.proxy_header.auto_create_users = false;
    config
}

/// The request headers that authenticate `user` against the test app.
pub fn auth_header(user: &UserDBResponse) -> (String, String) {
    let config = create_test_config();
    (config.auth.proxy_header.header_name, user.email.clone())
}

pub async fn create_test_user(pool: &PgPool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let user_id = Uuid::new_v4();
    let username = format!("testuser_{}", user_id.simple());
    let email = format!("{username}@example.com");

    let user_create = UserCreateDBRequest {
        username,
        email,
        display_name: Some("Test User".to_string()),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_site(pool: &PgPool) -> Site {
    sqlx::query_as::<_, Site>(
        "INSERT INTO sites (name, address, city, phone) VALUES ($1, $2, $3, $4) \
         RETURNING id, name, address, city, phone, created_at",
    )
    .bind(format!("Test Site {}", Uuid::new_v4().simple()))
    .bind("123 Example Street")
    .bind("Test City")
    .bind("555-0100")
    .fetch_one(pool)
    .await
    .expect("Failed to create test site")
}

pub async fn create_test_exam_type(pool: &PgPool) -> ExamType {
    sqlx::query_as::<_, ExamType>(
        "INSERT INTO exam_types (name, description) VALUES ($1, $2) \
         RETURNING id, name, description",
    )
    .bind(format!("Test Exam Type {}", Uuid::new_v4().simple()))
    .bind("Test category")
    .fetch_one(pool)
    .await
    .expect("Failed to create test exam type")
}

pub async fn create_test_exam_with_type(pool: &PgPool, exam_type_id: ExamTypeId) -> Exam {
    sqlx::query_as::<_, Exam>(
        "INSERT INTO exams (exam_type_id, name, description, preparation) VALUES ($1, $2, $3, $4) \
         RETURNING id, exam_type_id, name, description, preparation",
    )
    .bind(exam_type_id)
    .bind(format!("Test Exam {}", Uuid::new_v4().simple()))
    .bind("Test exam")
    .bind(Option::<String>::None)
    .fetch_one(pool)
    .await
    .expect("Failed to create test exam")
}

pub async fn create_test_exam(pool: &PgPool) -> Exam {
    let exam_type = create_test_exam_type(pool).await;
    create_test_exam_with_type(pool, exam_type.id).await
}

/// Create a slot on a fixed future date (2030-05-20, 09:00-09:30).
pub async fn create_test_slot(pool: &PgPool, site_id: SiteId, exam_id: ExamId, capacity: i32) -> Slot {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut slots_repo = Slots::new(&mut conn);
    slots_repo
        .create(&SlotCreateDBRequest {
            site_id,
            exam_id,
            slot_date: NaiveDate::from_ymd_opt(2030, 5, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            capacity,
        })
        .await
        .expect("Failed to create test slot")
}

/// The UTC instant a booking request must target to hit `slot`.
pub fn scheduled_at_for(slot: &Slot) -> DateTime<Utc> {
    Utc.from_utc_datetime(&slot.slot_date.and_time(slot.start_time))
}

/// Mark every unit of the slot as booked, bypassing the booking flow.
pub async fn fill_slot(pool: &PgPool, slot_id: SlotId) {
    sqlx::query("UPDATE slots SET booked_count = capacity WHERE id = $1")
        .bind(slot_id)
        .execute(pool)
        .await
        .expect("Failed to fill test slot");
}

pub async fn slot_booked_count(pool: &PgPool, slot_id: SlotId) -> i32 {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let slot = Slots::new(&mut conn)
        .get_by_id(slot_id)
        .await
        .expect("Failed to read slot")
        .expect("Slot should exist");
    slot.booked_count
}
