//! Timetable entry lifecycle: validated creation, patching and soft deletion.

use log::{info, warn};
use std::collections::HashMap;

use super::conflicts::{ConflictDetector, Placement};
use super::entity_validator::EntityValidator;
use super::error::{EntityKind, TimetableError, TimetableResult};
use crate::db::repository::FullRepository;
use crate::models::{
    normalize_text, Assignment, ClassId, EntryId, EntryPatch, NewTimetableEntry, SchoolId,
    TimeSlotId, TimetableEntry, UserId,
};

/// Creates, updates and deactivates entries.
///
/// Every mutation resolves its references and runs the conflict pre-checks
/// before touching storage.
pub struct TimetableEntryStore<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> TimetableEntryStore<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    fn validator(&self) -> EntityValidator<'a, R> {
        EntityValidator::new(self.repo)
    }

    fn detector(&self) -> ConflictDetector<'a, R> {
        ConflictDetector::new(self.repo)
    }

    /// Schedule `assignment` as a new active entry.
    ///
    /// # Errors
    /// * `NotFound` - class, subject, teacher or active time slot missing in the school
    /// * `Conflict` - class or teacher already scheduled this period
    pub async fn add_entry(
        &self,
        school_id: SchoolId,
        assignment: &Assignment,
    ) -> TimetableResult<TimetableEntry> {
        let validator = self.validator();
        validator
            .resolve_class(school_id, assignment.class_id)
            .await?;
        validator
            .resolve_subject(school_id, assignment.subject_id)
            .await?;
        validator
            .resolve_teacher(school_id, assignment.teacher_id)
            .await?;
        validator
            .resolve_active_time_slot(school_id, assignment.time_slot_id)
            .await?;

        let placement = Placement {
            class_id: assignment.class_id,
            teacher_id: assignment.teacher_id,
            time_slot_id: assignment.time_slot_id,
            day: assignment.day,
        };
        self.detector()
            .check(school_id, &placement, None)
            .await
            .inspect_err(|e| warn!("Rejected entry for class {}: {}", assignment.class_id, e))?;

        let entry = self
            .repo
            .insert_entry(&NewTimetableEntry {
                school_id,
                class_id: assignment.class_id,
                subject_id: assignment.subject_id,
                teacher_id: assignment.teacher_id,
                time_slot_id: assignment.time_slot_id,
                day: assignment.day,
                room: normalize_text(assignment.room.clone()),
                notes: normalize_text(assignment.notes.clone()),
            })
            .await
            .map_err(TimetableError::from)
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!("Storage rejected entry for class {}: {}", assignment.class_id, e);
                }
            })?;

        info!(
            "Scheduled entry {} (class {}, teacher {}) on {} in slot {}",
            entry.id, entry.class_id, entry.teacher_id, entry.day, entry.time_slot_id
        );
        Ok(entry)
    }

    /// Apply a patch to an active entry.
    ///
    /// Moving the entry (slot or day) re-checks both axes; changing only the
    /// teacher re-checks the teacher axis. The entry itself never conflicts
    /// with its own prior state.
    pub async fn update_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
        patch: &EntryPatch,
    ) -> TimetableResult<TimetableEntry> {
        let existing = self
            .repo
            .find_entry(school_id, entry_id)
            .await?
            .filter(TimetableEntry::is_active)
            .ok_or_else(|| TimetableError::not_found(EntityKind::Entry, entry_id))?;

        let validator = self.validator();
        if let Some(subject_id) = patch.subject_id {
            validator.resolve_subject(school_id, subject_id).await?;
        }
        if let Some(teacher_id) = patch.teacher_id {
            validator.resolve_teacher(school_id, teacher_id).await?;
        }
        if let Some(time_slot_id) = patch.time_slot_id {
            if time_slot_id != existing.time_slot_id {
                validator
                    .resolve_active_time_slot(school_id, time_slot_id)
                    .await?;
            }
        }

        let placement = Placement {
            class_id: existing.class_id,
            teacher_id: patch.teacher_id.unwrap_or(existing.teacher_id),
            time_slot_id: patch.time_slot_id.unwrap_or(existing.time_slot_id),
            day: patch.day.unwrap_or(existing.day),
        };
        let moved =
            placement.time_slot_id != existing.time_slot_id || placement.day != existing.day;
        let teacher_changed = placement.teacher_id != existing.teacher_id;

        let detector = self.detector();
        let checked = if moved {
            detector.check(school_id, &placement, Some(entry_id)).await
        } else if teacher_changed {
            detector
                .check_teacher(school_id, &placement, Some(entry_id))
                .await
        } else {
            Ok(())
        };
        checked.inspect_err(|e| warn!("Rejected update of entry {}: {}", entry_id, e))?;

        let merged = TimetableEntry {
            subject_id: patch.subject_id.unwrap_or(existing.subject_id),
            teacher_id: placement.teacher_id,
            time_slot_id: placement.time_slot_id,
            day: placement.day,
            room: match &patch.room {
                Some(room) => normalize_text(room.clone()),
                None => existing.room.clone(),
            },
            notes: match &patch.notes {
                Some(notes) => normalize_text(notes.clone()),
                None => existing.notes.clone(),
            },
            ..existing
        };
        let updated = self
            .repo
            .update_entry(&merged)
            .await
            .map_err(TimetableError::from)
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!("Storage rejected update of entry {}: {}", entry_id, e);
                }
            })?;

        info!("Updated entry {} for school {}", entry_id, school_id);
        Ok(updated)
    }

    /// Soft-delete an entry. Repeating the call is a no-op.
    pub async fn deactivate_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> TimetableResult<TimetableEntry> {
        let existing = self.get_entry(school_id, entry_id).await?;
        if !existing.is_active() {
            return Ok(existing);
        }

        let entry = self.repo.deactivate_entry(school_id, entry_id).await?;
        info!("Deactivated entry {} for school {}", entry_id, school_id);
        Ok(entry)
    }

    /// Any entry of the school, active or not.
    pub async fn get_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> TimetableResult<TimetableEntry> {
        self.repo
            .find_entry(school_id, entry_id)
            .await?
            .ok_or_else(|| TimetableError::not_found(EntityKind::Entry, entry_id))
    }

    /// Active entries of a class, by day then slot order.
    pub async fn list_class_entries(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> TimetableResult<Vec<TimetableEntry>> {
        self.validator().resolve_class(school_id, class_id).await?;
        let entries = self
            .repo
            .list_active_entries_for_class(school_id, class_id)
            .await?;
        self.sorted(school_id, entries).await
    }

    /// Active entries taught by a teacher, by day then slot order.
    pub async fn list_teacher_entries(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> TimetableResult<Vec<TimetableEntry>> {
        self.validator()
            .resolve_teacher(school_id, teacher_id)
            .await?;
        let entries = self
            .repo
            .list_active_entries_for_teacher(school_id, teacher_id)
            .await?;
        self.sorted(school_id, entries).await
    }

    async fn sorted(
        &self,
        school_id: SchoolId,
        mut entries: Vec<TimetableEntry>,
    ) -> TimetableResult<Vec<TimetableEntry>> {
        let slot_keys: HashMap<TimeSlotId, _> = self
            .repo
            .list_time_slots(school_id, false)
            .await?
            .into_iter()
            .map(|slot| (slot.id, (slot.order, slot.start_time)))
            .collect();
        entries.sort_by_key(|entry| {
            (
                entry.day,
                slot_keys.get(&entry.time_slot_id).copied(),
                entry.time_slot_id,
                entry.id,
            )
        });
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "timetable_tests.rs"]
mod tests;
