//! Database record models matching table schemas.
//!
//! Each model struct corresponds to a database table row and derives
//! `sqlx::FromRow` for query results. Database models are distinct from API
//! models so that storage and API representations can evolve independently;
//! repositories return `*DBResponse` types which the API layer converts via
//! `From` impls.
//!
//! - [`users`]: requester (patient) records
//! - [`catalog`]: read-only reference data (sites, exam types, exams)
//! - [`slots`]: bookable time slots and their capacity accounting
//! - [`appointments`]: the appointment ledger

pub mod appointments;
pub mod catalog;
pub mod slots;
pub mod users;
