//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: axum route handlers for all API endpoints
//! - **[`models`]**: request/response data structures for API communication
//!
//! The API lives under `/api/v1`:
//!
//! - **Appointments** (`/api/v1/appointments*`): book, list, inspect and
//!   cancel the authenticated user's appointments
//! - **Availability** (`/api/v1/availability/*`): read-only queries over
//!   remaining slot capacity
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;
