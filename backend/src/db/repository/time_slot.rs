//! Time slot persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewTimeSlot, SchoolId, TimeSlot, TimeSlotId};

/// Repository trait for time slots.
///
/// Slots are never removed; deactivation flips their status.
#[async_trait]
pub trait TimeSlotRepository: Send + Sync {
    /// Insert a new active slot.
    ///
    /// # Errors
    /// * `Conflict` - the range overlaps an active slot of the same school
    async fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepositoryResult<TimeSlot>;

    /// Replace the mutable fields (times, label, order) of an existing slot.
    ///
    /// # Errors
    /// * `NotFound` - no slot with this id in the slot's school
    /// * `Conflict` - the new range overlaps another active slot
    async fn update_time_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot>;

    /// Mark a slot inactive.
    ///
    /// # Errors
    /// * `NotFound` - no such slot in the school
    /// * `Conflict` - an active entry still references the slot
    async fn deactivate_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<TimeSlot>;

    /// Find a slot of the school regardless of status.
    async fn find_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<Option<TimeSlot>>;

    /// List a school's slots ordered by `order`, then start time, then id.
    async fn list_time_slots(
        &self,
        school_id: SchoolId,
        active_only: bool,
    ) -> RepositoryResult<Vec<TimeSlot>>;
}
