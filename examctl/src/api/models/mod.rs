//! Request/response data structures for the HTTP API.
//!
//! API models are separate from [`crate::db::models`]; conversions are
//! explicit `From` impls so the wire format can evolve independently of the
//! schema.

pub mod appointments;
pub mod availability;
pub mod users;
