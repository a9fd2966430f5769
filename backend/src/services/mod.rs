//! Service layer for scheduling rules and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! borrow a repository, resolve every reference against the requesting
//! school, run the conflict pre-checks and only then write. The repository
//! stays the authoritative guard; its conflicts surface through the same
//! [`TimetableError::Conflict`] variant.

pub mod conflicts;
pub mod entity_validator;
pub mod error;
pub mod time_slots;
pub mod timetable;
pub mod weekly_grid;

pub use conflicts::{ConflictDetector, Placement};
pub use entity_validator::EntityValidator;
pub use error::{ConflictDetail, EntityKind, TimetableError, TimetableResult};
pub use time_slots::{find_overlap, TimeSlotRegistry};
pub use timetable::TimetableEntryStore;
pub use weekly_grid::WeeklyGridBuilder;
