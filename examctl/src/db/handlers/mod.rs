//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one entity, and returns record types from
//! [`crate::db::models`].
//!
//! - [`Slots`]: slot capacity control (row locking, counter mutation) and
//!   read-only availability queries
//! - [`Appointments`]: the appointment ledger
//! - [`Users`]: requester lookup and creation

pub mod appointments;
pub mod slots;
pub mod users;

pub use appointments::Appointments;
pub use slots::Slots;
pub use users::Users;
