//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives behind a
//! single lock, so every guard check and the write it protects happen
//! atomically.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::entities;
use crate::db::repository::*;
use crate::models::{
    ClassId, DayOfWeek, EntryId, NewTimeSlot, NewTimetableEntry, RecordStatus, School,
    SchoolClass, SchoolId, Subject, SubjectId, TimeSlot, TimeSlotId, TimetableEntry, User, UserId,
};

/// In-memory local repository.
///
/// Directory records are seeded through [`add_school`](Self::add_school) and
/// friends; time slots and entries go through the repository traits.
///
/// # Example
/// ```
/// use timetable_engine::db::repositories::LocalRepository;
/// use timetable_engine::models::{School, SchoolId};
///
/// let repo = LocalRepository::new();
/// repo.add_school(School::new(SchoolId(1), "Northside"));
/// assert_eq!(repo.time_slot_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    // Directory
    schools: HashMap<SchoolId, School>,
    classes: HashMap<ClassId, SchoolClass>,
    subjects: HashMap<SubjectId, Subject>,
    users: HashMap<UserId, User>,

    // Scheduling
    time_slots: BTreeMap<TimeSlotId, TimeSlot>,
    entries: BTreeMap<EntryId, TimetableEntry>,

    // ID counters
    next_time_slot_id: i64,
    next_entry_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            schools: HashMap::new(),
            classes: HashMap::new(),
            subjects: HashMap::new(),
            users: HashMap::new(),
            time_slots: BTreeMap::new(),
            entries: BTreeMap::new(),
            next_time_slot_id: 1,
            next_entry_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    fn slot_in_school(&self, school_id: SchoolId, id: TimeSlotId) -> Option<&TimeSlot> {
        self.time_slots
            .get(&id)
            .filter(|slot| slot.school_id == school_id)
    }

    fn entry_in_school(&self, school_id: SchoolId, id: EntryId) -> Option<&TimetableEntry> {
        self.entries
            .get(&id)
            .filter(|entry| entry.school_id == school_id)
    }

    /// First active slot of the school overlapping `slot`, ignoring `exclude`.
    fn overlapping_slot(
        &self,
        school_id: SchoolId,
        range: crate::models::TimeRange,
        exclude: Option<TimeSlotId>,
    ) -> Option<&TimeSlot> {
        self.time_slots.values().find(|other| {
            other.school_id == school_id
                && other.is_active()
                && Some(other.id) != exclude
                && other.range().overlaps(&range)
        })
    }

    fn active_entries(&self, school_id: SchoolId) -> impl Iterator<Item = &TimetableEntry> {
        self.entries
            .values()
            .filter(move |entry| entry.school_id == school_id && entry.is_active())
    }

    /// Enforce both double-booking guards for a prospective active entry.
    #[allow(clippy::too_many_arguments)]
    fn check_bookings(
        &self,
        operation: &str,
        school_id: SchoolId,
        class_id: ClassId,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
        exclude: Option<EntryId>,
    ) -> RepositoryResult<()> {
        for other in self.active_entries(school_id) {
            if Some(other.id) == exclude
                || other.time_slot_id != time_slot_id
                || other.day != day
            {
                continue;
            }
            let axis = if other.class_id == class_id {
                "class"
            } else if other.teacher_id == teacher_id {
                "teacher"
            } else {
                continue;
            };
            return Err(RepositoryError::conflict_with_context(
                format!("{} already booked for {} in slot {}", axis, day, time_slot_id),
                ErrorContext::new(operation)
                    .with_entity(entities::TIMETABLE_ENTRY)
                    .with_entity_id(other.id)
                    .with_details(format!("axis={}", axis)),
            ));
        }
        Ok(())
    }

    fn require_active_slot(
        &self,
        operation: &str,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<()> {
        match self.slot_in_school(school_id, time_slot_id) {
            Some(slot) if slot.is_active() => Ok(()),
            _ => Err(RepositoryError::entity_not_found(
                operation,
                entities::TIME_SLOT,
                time_slot_id,
            )),
        }
    }
}

fn sort_slots(slots: &mut [TimeSlot]) {
    slots.sort_by_key(|slot| (slot.order, slot.start_time, slot.id));
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Seed a school into the directory.
    pub fn add_school(&self, school: School) {
        self.data.write().schools.insert(school.id, school);
    }

    /// Seed a class into the directory.
    pub fn add_class(&self, class: SchoolClass) {
        self.data.write().classes.insert(class.id, class);
    }

    /// Seed a subject into the directory.
    pub fn add_subject(&self, subject: Subject) {
        self.data.write().subjects.insert(subject.id, subject);
    }

    /// Seed a user (any role) into the directory.
    pub fn add_user(&self, user: User) {
        self.data.write().users.insert(user.id, user);
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of stored time slots, active or not.
    pub fn time_slot_count(&self) -> usize {
        self.data.read().time_slots.len()
    }

    /// Number of stored entries, active or not.
    pub fn entry_count(&self) -> usize {
        self.data.read().entries.len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>> {
        let data = self.data.read();
        data.check_health("find_school")?;
        Ok(data.schools.get(&school_id).cloned())
    }

    async fn find_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Option<SchoolClass>> {
        let data = self.data.read();
        data.check_health("find_class")?;
        Ok(data
            .classes
            .get(&class_id)
            .filter(|class| class.school_id == school_id)
            .cloned())
    }

    async fn find_subject(
        &self,
        school_id: SchoolId,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<Subject>> {
        let data = self.data.read();
        data.check_health("find_subject")?;
        Ok(data
            .subjects
            .get(&subject_id)
            .filter(|subject| subject.school_id == school_id)
            .cloned())
    }

    async fn find_user(
        &self,
        school_id: SchoolId,
        user_id: UserId,
    ) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        data.check_health("find_user")?;
        Ok(data
            .users
            .get(&user_id)
            .filter(|user| user.school_id == school_id)
            .cloned())
    }
}

#[async_trait]
impl TimeSlotRepository for LocalRepository {
    async fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepositoryResult<TimeSlot> {
        let mut data = self.data.write();
        data.check_health("insert_time_slot")?;

        if let Some(other) = data.overlapping_slot(slot.school_id, slot.range, None) {
            return Err(RepositoryError::conflict_with_context(
                format!("time slot overlaps '{}' ({})", other.label, other.range()),
                ErrorContext::new("insert_time_slot")
                    .with_entity(entities::TIME_SLOT)
                    .with_entity_id(other.id),
            ));
        }

        let id = TimeSlotId(data.next_time_slot_id);
        data.next_time_slot_id += 1;

        let now = Utc::now();
        let stored = TimeSlot {
            id,
            school_id: slot.school_id,
            start_time: slot.range.start,
            end_time: slot.range.end,
            label: slot.label.clone(),
            order: slot.order,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        data.time_slots.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_time_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        let mut data = self.data.write();
        data.check_health("update_time_slot")?;

        let existing = data
            .slot_in_school(slot.school_id, slot.id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::entity_not_found("update_time_slot", entities::TIME_SLOT, slot.id)
            })?;

        if existing.is_active() {
            if let Some(other) = data.overlapping_slot(slot.school_id, slot.range(), Some(slot.id))
            {
                return Err(RepositoryError::conflict_with_context(
                    format!("time slot overlaps '{}' ({})", other.label, other.range()),
                    ErrorContext::new("update_time_slot")
                        .with_entity(entities::TIME_SLOT)
                        .with_entity_id(other.id),
                ));
            }
        }

        let updated = TimeSlot {
            start_time: slot.start_time,
            end_time: slot.end_time,
            label: slot.label.clone(),
            order: slot.order,
            updated_at: Utc::now(),
            ..existing
        };
        data.time_slots.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn deactivate_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<TimeSlot> {
        let mut data = self.data.write();
        data.check_health("deactivate_time_slot")?;

        let existing = data
            .slot_in_school(school_id, time_slot_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::entity_not_found(
                    "deactivate_time_slot",
                    entities::TIME_SLOT,
                    time_slot_id,
                )
            })?;
        if !existing.is_active() {
            return Ok(existing);
        }

        let in_use = data
            .active_entries(school_id)
            .filter(|entry| entry.time_slot_id == time_slot_id)
            .count();
        if in_use > 0 {
            return Err(RepositoryError::conflict_with_context(
                format!("time slot {} is referenced by {} active entries", time_slot_id, in_use),
                ErrorContext::new("deactivate_time_slot")
                    .with_entity(entities::TIME_SLOT)
                    .with_entity_id(time_slot_id),
            ));
        }

        let updated = TimeSlot {
            status: RecordStatus::Inactive,
            updated_at: Utc::now(),
            ..existing
        };
        data.time_slots.insert(time_slot_id, updated.clone());
        Ok(updated)
    }

    async fn find_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<Option<TimeSlot>> {
        let data = self.data.read();
        data.check_health("find_time_slot")?;
        Ok(data.slot_in_school(school_id, time_slot_id).cloned())
    }

    async fn list_time_slots(
        &self,
        school_id: SchoolId,
        active_only: bool,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        let data = self.data.read();
        data.check_health("list_time_slots")?;
        let mut slots: Vec<TimeSlot> = data
            .time_slots
            .values()
            .filter(|slot| slot.school_id == school_id && (!active_only || slot.is_active()))
            .cloned()
            .collect();
        sort_slots(&mut slots);
        Ok(slots)
    }
}

#[async_trait]
impl TimetableEntryRepository for LocalRepository {
    async fn insert_entry(&self, entry: &NewTimetableEntry) -> RepositoryResult<TimetableEntry> {
        let mut data = self.data.write();
        data.check_health("insert_entry")?;

        data.require_active_slot("insert_entry", entry.school_id, entry.time_slot_id)?;
        data.check_bookings(
            "insert_entry",
            entry.school_id,
            entry.class_id,
            entry.teacher_id,
            entry.time_slot_id,
            entry.day,
            None,
        )?;

        let id = EntryId(data.next_entry_id);
        data.next_entry_id += 1;

        let now = Utc::now();
        let stored = TimetableEntry {
            id,
            school_id: entry.school_id,
            class_id: entry.class_id,
            subject_id: entry.subject_id,
            teacher_id: entry.teacher_id,
            time_slot_id: entry.time_slot_id,
            day: entry.day,
            room: entry.room.clone(),
            notes: entry.notes.clone(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        data.entries.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_entry(&self, entry: &TimetableEntry) -> RepositoryResult<TimetableEntry> {
        let mut data = self.data.write();
        data.check_health("update_entry")?;

        let existing = data
            .entry_in_school(entry.school_id, entry.id)
            .filter(|existing| existing.is_active())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::entity_not_found(
                    "update_entry",
                    entities::TIMETABLE_ENTRY,
                    entry.id,
                )
            })?;

        if existing.time_slot_id != entry.time_slot_id {
            data.require_active_slot("update_entry", entry.school_id, entry.time_slot_id)?;
        }
        data.check_bookings(
            "update_entry",
            entry.school_id,
            existing.class_id,
            entry.teacher_id,
            entry.time_slot_id,
            entry.day,
            Some(entry.id),
        )?;

        let updated = TimetableEntry {
            subject_id: entry.subject_id,
            teacher_id: entry.teacher_id,
            time_slot_id: entry.time_slot_id,
            day: entry.day,
            room: entry.room.clone(),
            notes: entry.notes.clone(),
            updated_at: Utc::now(),
            ..existing
        };
        data.entries.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn deactivate_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<TimetableEntry> {
        let mut data = self.data.write();
        data.check_health("deactivate_entry")?;

        let existing = data
            .entry_in_school(school_id, entry_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::entity_not_found(
                    "deactivate_entry",
                    entities::TIMETABLE_ENTRY,
                    entry_id,
                )
            })?;
        if !existing.is_active() {
            return Ok(existing);
        }

        let updated = TimetableEntry {
            status: RecordStatus::Inactive,
            updated_at: Utc::now(),
            ..existing
        };
        data.entries.insert(entry_id, updated.clone());
        Ok(updated)
    }

    async fn find_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        let data = self.data.read();
        data.check_health("find_entry")?;
        Ok(data.entry_in_school(school_id, entry_id).cloned())
    }

    async fn find_active_by_class_slot_day(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        let data = self.data.read();
        data.check_health("find_active_by_class_slot_day")?;
        let entry = data
            .active_entries(school_id)
            .find(|e| e.class_id == class_id && e.time_slot_id == time_slot_id && e.day == day)
            .cloned();
        Ok(entry)
    }

    async fn find_active_by_teacher_slot_day(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        let data = self.data.read();
        data.check_health("find_active_by_teacher_slot_day")?;
        let entry = data
            .active_entries(school_id)
            .find(|e| e.teacher_id == teacher_id && e.time_slot_id == time_slot_id && e.day == day)
            .cloned();
        Ok(entry)
    }

    async fn list_active_entries_for_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TimetableEntry>> {
        let data = self.data.read();
        data.check_health("list_active_entries_for_class")?;
        Ok(data
            .active_entries(school_id)
            .filter(|e| e.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn list_active_entries_for_teacher(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> RepositoryResult<Vec<TimetableEntry>> {
        let data = self.data.read();
        data.check_health("list_active_entries_for_teacher")?;
        Ok(data
            .active_entries(school_id)
            .filter(|e| e.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn count_active_entries_for_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<usize> {
        let data = self.data.read();
        data.check_health("count_active_entries_for_slot")?;
        Ok(data
            .active_entries(school_id)
            .filter(|e| e.time_slot_id == time_slot_id)
            .count())
    }
}
