//! Repository trait definitions for scheduling persistence.
//!
//! Persistence is split across focused traits so each backend can be tested
//! per concern:
//!
//! - [`error`]: Error types for repository operations
//! - [`directory`]: Read-only lookups into the school directory
//! - [`time_slot`]: Time slot storage with the non-overlap guard
//! - [`timetable`]: Timetable entry storage with the double-booking guards
//!
//! # Authoritative guards
//!
//! Implementations must enforce, atomically with the write:
//! - active time slots of a school never overlap
//! - active entries are unique on `(class, time_slot, day)`
//! - active entries are unique on `(teacher, time_slot, day)`
//! - a time slot with active entries is never deactivated
//!
//! A violated guard is reported as [`RepositoryError::Conflict`]. The service
//! layer pre-checks the same rules to produce specific messages; the guards
//! close the race window between two concurrent requests.

pub mod directory;
pub mod error;
pub mod time_slot;
pub mod timetable;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use directory::DirectoryRepository;
pub use time_slot::TimeSlotRepository;
pub use timetable::TimetableEntryRepository;

/// Entity labels used in [`ErrorContext::entity`].
pub mod entities {
    pub const SCHOOL: &str = "school";
    pub const CLASS: &str = "class";
    pub const SUBJECT: &str = "subject";
    pub const USER: &str = "user";
    pub const TIME_SLOT: &str = "time_slot";
    pub const TIMETABLE_ENTRY: &str = "timetable_entry";
}

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
///
/// # Example
///
/// ```ignore
/// async fn weekly<R: FullRepository + ?Sized>(repo: &R, school: SchoolId, class: ClassId) {
///     let grid = WeeklyGridBuilder::new(repo).get_weekly_timetable(school, class).await;
/// }
/// ```
pub trait FullRepository: DirectoryRepository + TimeSlotRepository + TimetableEntryRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where
    T: DirectoryRepository + TimeSlotRepository + TimetableEntryRepository
{
}
