//! Timetable entry persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    ClassId, DayOfWeek, EntryId, NewTimetableEntry, SchoolId, TimeSlotId, TimetableEntry, UserId,
};

/// Repository trait for timetable entries.
///
/// Entries are never removed; deactivation flips their status and is final.
#[async_trait]
pub trait TimetableEntryRepository: Send + Sync {
    /// Insert a new active entry.
    ///
    /// # Errors
    /// * `NotFound` - the referenced time slot is missing or inactive
    /// * `Conflict` - the class or teacher is already booked for the slot and day
    async fn insert_entry(&self, entry: &NewTimetableEntry) -> RepositoryResult<TimetableEntry>;

    /// Replace the mutable fields of an active entry.
    ///
    /// # Errors
    /// * `NotFound` - no active entry with this id in the school, or the new
    ///   time slot is missing or inactive
    /// * `Conflict` - the new placement double-books the class or teacher
    async fn update_entry(&self, entry: &TimetableEntry) -> RepositoryResult<TimetableEntry>;

    /// Mark an entry inactive. Deactivating an inactive entry is a no-op.
    async fn deactivate_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<TimetableEntry>;

    /// Find an entry of the school regardless of status.
    async fn find_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<Option<TimetableEntry>>;

    /// The active entry occupying `(class, time_slot, day)`, if any.
    async fn find_active_by_class_slot_day(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>>;

    /// The active entry occupying `(teacher, time_slot, day)`, if any.
    async fn find_active_by_teacher_slot_day(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>>;

    async fn list_active_entries_for_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TimetableEntry>>;

    async fn list_active_entries_for_teacher(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> RepositoryResult<Vec<TimetableEntry>>;

    /// Number of active entries referencing a time slot.
    async fn count_active_entries_for_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<usize>;
}
