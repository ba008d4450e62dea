//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: requester (patient) identifier
//! - [`SiteId`]: examination site identifier
//! - [`ExamTypeId`]: exam category identifier
//! - [`ExamId`]: specific exam identifier
//! - [`SlotId`]: bookable time-slot identifier
//! - [`AppointmentId`]: appointment (reservation) identifier

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type SiteId = Uuid;
pub type ExamTypeId = Uuid;
pub type ExamId = Uuid;
pub type SlotId = Uuid;
pub type AppointmentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
