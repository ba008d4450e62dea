//! # examctl: Exam Appointment Control Layer
//!
//! `examctl` books medical-exam appointments against finite time-slot
//! capacity. Its core is the concurrency-safe slot-reservation mechanism: no
//! more appointments are ever committed against a slot than its declared
//! capacity, even under concurrent requests across multiple service
//! replicas, and cancellation releases capacity correctly.
//!
//! ## Overview
//!
//! Examination sites publish slots - a (site, exam, date, time-range) unit
//! with a fixed capacity. Patients query availability, book a slot unit, and
//! may cancel their own appointments. The interesting part is that popular
//! slots get booked concurrently, and the service must hand out exactly
//! `capacity` units, never more.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence needs.
//!
//! Correctness under concurrency comes from the database, not from process
//! memory: every capacity mutation runs inside a transaction that first takes
//! a `SELECT ... FOR UPDATE` row lock on the single targeted slot
//! ([`db::handlers::slots::Slots`]), checks remaining capacity, moves the
//! counter, and writes the appointment ledger row - committing or rolling
//! back as one unit ([`booking::BookingService`]). An in-process mutex would
//! not survive horizontal replication; the row lock does. Lock waits are
//! bounded so a stuck transaction degrades into a retriable 503 instead of
//! piling up requests.
//!
//! The **API layer** ([`api`]) exposes the booking operations and read-only
//! availability queries under `/api/v1`, documented via OpenAPI at `/docs`.
//! The **authentication layer** ([`auth`]) resolves a trusted proxy header
//! to the current user. The **database layer** ([`db`]) uses the repository
//! pattern over SQLx connections.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use examctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = examctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     examctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup; [`migrator`] exposes the migrator for external
//! tooling.

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::openapi::ApiDoc;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AppointmentId, ExamId, ExamTypeId, SiteId, SlotId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the examctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the main pool and run migrations
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Build the main application router with all endpoints and middleware.
///
/// - health check at `/healthz`
/// - booking and availability API under `/api/v1`
/// - OpenAPI documentation at `/docs`
/// - tracing middleware on everything
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/appointments",
            post(api::handlers::appointments::book_appointment).get(api::handlers::appointments::list_appointments),
        )
        .route("/appointments/{id}", get(api::handlers::appointments::get_appointment))
        .route(
            "/appointments/{id}/cancel",
            post(api::handlers::appointments::cancel_appointment),
        )
        .route("/availability/dates", get(api::handlers::availability::available_dates))
        .route("/availability/sites", get(api::handlers::availability::available_sites))
        .route(
            "/availability/exam-types",
            get(api::handlers::availability::available_exam_types),
        )
        .route("/availability/exams", get(api::handlers::availability::available_exams))
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the pool and runs migrations
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
/// 3. **Shutdown**: on the shutdown signal, drains gracefully and closes the
///    database pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting exam control layer with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Exam control layer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{create_test_app, create_test_config};
    use sqlx::{ConnectOptions, PgPool};

    #[sqlx::test]
    #[test_log::test]
    async fn healthz_and_docs_are_served(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        assert_eq!(response.status_code().as_u16(), 200);
        assert_eq!(response.text(), "OK");

        let response = server.get("/docs").await;
        assert_eq!(response.status_code().as_u16(), 200);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn api_routes_require_authentication(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/v1/appointments").await;
        assert_eq!(response.status_code().as_u16(), 401);
    }

    #[sqlx::test]
    async fn application_integration(pool: PgPool) {
        let mut config = create_test_config();
        config.database.url = pool.connect_options().to_url_lossy().to_string();

        let app = crate::Application::new(config).await;
        assert!(app.is_ok(), "Application::new should succeed");

        let server = app.unwrap().into_test_server();
        let health_response = server.get("/healthz").await;
        assert_eq!(health_response.status_code().as_u16(), 200);
    }
}
