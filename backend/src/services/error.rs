//! Caller-facing errors of the scheduling services.

use serde::Serialize;
use std::fmt;

use crate::db::repository::{entities, RepositoryError};
use crate::models::{DayOfWeek, EntryId, TimeOfDay, TimeSlotId};

/// Result type for service operations.
pub type TimetableResult<T> = Result<T, TimetableError>;

/// Kind of record named by a [`TimetableError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    School,
    Class,
    Subject,
    Teacher,
    TimeSlot,
    Entry,
    /// A storage record whose kind the backend did not report.
    Record,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::School => "school",
            EntityKind::Class => "class",
            EntityKind::Subject => "subject",
            EntityKind::Teacher => "teacher",
            EntityKind::TimeSlot => "time slot",
            EntityKind::Entry => "timetable entry",
            EntityKind::Record => "record",
        }
    }

    fn from_repository_entity(entity: Option<&str>) -> Self {
        match entity {
            Some(entities::SCHOOL) => EntityKind::School,
            Some(entities::CLASS) => EntityKind::Class,
            Some(entities::SUBJECT) => EntityKind::Subject,
            Some(entities::USER) => EntityKind::Teacher,
            Some(entities::TIME_SLOT) => EntityKind::TimeSlot,
            Some(entities::TIMETABLE_ENTRY) => EntityKind::Entry,
            _ => EntityKind::Record,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a rejected write collided with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictDetail {
    /// The requested range overlaps an active slot.
    #[serde(rename_all = "camelCase")]
    SlotOverlap {
        time_slot_id: TimeSlotId,
        label: String,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    /// The class already has an active entry in this slot and day.
    #[serde(rename_all = "camelCase")]
    ClassBooked {
        entry_id: EntryId,
        day: DayOfWeek,
        time_slot_id: TimeSlotId,
    },
    /// The teacher already has an active entry in this slot and day.
    #[serde(rename_all = "camelCase")]
    TeacherBooked {
        entry_id: EntryId,
        day: DayOfWeek,
        time_slot_id: TimeSlotId,
    },
    /// Active entries still reference the slot.
    #[serde(rename_all = "camelCase")]
    SlotInUse {
        time_slot_id: TimeSlotId,
        active_entries: usize,
    },
    /// The storage guard rejected a write that passed the pre-checks.
    Storage { message: String },
}

impl fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictDetail::SlotOverlap {
                label, start, end, ..
            } => write!(f, "time slot overlaps '{}' ({}-{})", label, start, end),
            ConflictDetail::ClassBooked {
                entry_id,
                day,
                time_slot_id,
            } => write!(
                f,
                "class already scheduled this period (entry {} on {} in slot {})",
                entry_id, day, time_slot_id
            ),
            ConflictDetail::TeacherBooked {
                entry_id,
                day,
                time_slot_id,
            } => write!(
                f,
                "teacher already scheduled this period (entry {} on {} in slot {})",
                entry_id, day, time_slot_id
            ),
            ConflictDetail::SlotInUse {
                time_slot_id,
                active_entries,
            } => write!(
                f,
                "time slot {} is in use by {} active entries",
                time_slot_id, active_entries
            ),
            ConflictDetail::Storage { message } => f.write_str(message),
        }
    }
}

/// Error returned by the scheduling services.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// Input rejected before reaching storage.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A referenced record is missing or belongs to another school.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    /// The write would break a scheduling invariant.
    #[error("conflict: {0}")]
    Conflict(ConflictDetail),

    /// Unexpected storage or connectivity failure.
    #[error("internal error: {0}")]
    Internal(RepositoryError),
}

impl TimetableError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn conflict_detail(&self) -> Option<&ConflictDetail> {
        match self {
            Self::Conflict(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<RepositoryError> for TimetableError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { context, .. } => Self::NotFound {
                entity: EntityKind::from_repository_entity(context.entity.as_deref()),
                id: context.entity_id.unwrap_or_default(),
            },
            RepositoryError::Conflict { message, .. } => {
                Self::Conflict(ConflictDetail::Storage { message })
            }
            RepositoryError::ValidationError { message, .. } => Self::Validation {
                field: "record",
                message,
            },
            other => Self::Internal(other),
        }
    }
}
