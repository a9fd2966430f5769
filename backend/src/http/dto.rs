//! Data Transfer Objects for the HTTP API.
//!
//! Entries, patches and grids already derive `Serialize`/`Deserialize` in
//! [`crate::models`] and go over the wire as-is. The types here cover the
//! request and response shapes that differ from the domain records.

use serde::{Deserialize, Serialize};

use crate::models::{TimeOfDay, TimeSlot, TimeSlotId};

pub use crate::models::{Assignment, EntryPatch, TimeSlotPatch, TimetableEntry, WeeklyTimetable};

/// Request body for creating a time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeSlotRequest {
    /// Start of the slot, `HH:mm`
    pub start_time: String,
    /// End of the slot, `HH:mm`
    pub end_time: String,
    pub label: String,
    /// Display position, starting at 1
    pub order: i32,
}

/// Time slot as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotResponse {
    pub id: TimeSlotId,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub label: String,
    pub order: i32,
}

impl From<TimeSlot> for TimeSlotResponse {
    fn from(slot: TimeSlot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            label: slot.label,
            order: slot.order,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}
