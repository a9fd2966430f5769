//! Read-side projection of a week of lessons into a day x slot grid.

use log::debug;
use std::collections::{BTreeMap, HashMap};

use super::entity_validator::EntityValidator;
use super::error::TimetableResult;
use super::time_slots::sort_slots;
use crate::db::repository::FullRepository;
use crate::models::{
    ClassId, ClassSummary, DayOfWeek, GridCell, GridOwner, GridSlot, School, SchoolId,
    SubjectId, TeacherSummary, TimetableEntry, UserId, WeeklyTimetable,
};

/// Which name fills the "who" column of an assigned cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Perspective {
    Class,
    Teacher,
}

/// Builds weekly grids. Performs no writes.
pub struct WeeklyGridBuilder<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> WeeklyGridBuilder<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// The week of one class: one row per calendar day, one cell per active slot.
    ///
    /// Assigned cells name the subject, the teacher and the room.
    pub async fn get_weekly_timetable(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> TimetableResult<WeeklyTimetable> {
        let validator = EntityValidator::new(self.repo);
        let school = validator.resolve_school(school_id).await?;
        let class = validator.resolve_class(school_id, class_id).await?;

        let entries = self
            .repo
            .list_active_entries_for_class(school_id, class_id)
            .await?;
        let owner = GridOwner::Class(ClassSummary {
            id: class.id,
            name: class.name,
        });
        self.build(&school, owner, entries, Perspective::Class)
            .await
    }

    /// The week of one teacher. Assigned cells name the class instead of the teacher.
    pub async fn get_teacher_weekly_timetable(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> TimetableResult<WeeklyTimetable> {
        let validator = EntityValidator::new(self.repo);
        let school = validator.resolve_school(school_id).await?;
        let teacher = validator.resolve_teacher(school_id, teacher_id).await?;

        let entries = self
            .repo
            .list_active_entries_for_teacher(school_id, teacher_id)
            .await?;
        let owner = GridOwner::Teacher(TeacherSummary {
            id: teacher.id,
            name: teacher.full_name(),
        });
        self.build(&school, owner, entries, Perspective::Teacher)
            .await
    }

    async fn build(
        &self,
        school: &School,
        owner: GridOwner,
        entries: Vec<TimetableEntry>,
        perspective: Perspective,
    ) -> TimetableResult<WeeklyTimetable> {
        let mut slots = self.repo.list_time_slots(school.id, true).await?;
        sort_slots(&mut slots);

        let days = school.calendar.days();
        let mut schedule: BTreeMap<DayOfWeek, Vec<GridCell>> = days
            .iter()
            .map(|day| (*day, slots.iter().map(GridCell::empty).collect()))
            .collect();

        let names = self.names_for(school.id, &entries, perspective).await?;
        let slot_index: HashMap<_, _> = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (slot.id, index))
            .collect();

        for entry in &entries {
            let cell = schedule
                .get_mut(&entry.day)
                .zip(slot_index.get(&entry.time_slot_id))
                .and_then(|(cells, index)| cells.get_mut(*index));
            let Some(cell) = cell else {
                debug!(
                    "Entry {} on {} in slot {} falls outside the grid of school {}",
                    entry.id, entry.day, entry.time_slot_id, school.id
                );
                continue;
            };
            names.fill(cell, entry, perspective);
        }

        Ok(WeeklyTimetable {
            owner,
            time_slots: slots.iter().map(GridSlot::from).collect(),
            schedule,
        })
    }

    async fn names_for(
        &self,
        school_id: SchoolId,
        entries: &[TimetableEntry],
        perspective: Perspective,
    ) -> TimetableResult<NameLookup> {
        let mut names = NameLookup::default();
        for entry in entries {
            if !names.subjects.contains_key(&entry.subject_id) {
                let subject = self.repo.find_subject(school_id, entry.subject_id).await?;
                names
                    .subjects
                    .insert(entry.subject_id, subject.map(|s| s.name));
            }
            match perspective {
                Perspective::Class => {
                    if !names.teachers.contains_key(&entry.teacher_id) {
                        let teacher = self.repo.find_user(school_id, entry.teacher_id).await?;
                        names
                            .teachers
                            .insert(entry.teacher_id, teacher.map(|u| u.full_name()));
                    }
                }
                Perspective::Teacher => {
                    if !names.classes.contains_key(&entry.class_id) {
                        let class = self.repo.find_class(school_id, entry.class_id).await?;
                        names.classes.insert(entry.class_id, class.map(|c| c.name));
                    }
                }
            }
        }
        Ok(names)
    }
}

/// Directory names of the records a grid refers to, fetched once each.
#[derive(Default)]
struct NameLookup {
    subjects: HashMap<SubjectId, Option<String>>,
    teachers: HashMap<UserId, Option<String>>,
    classes: HashMap<ClassId, Option<String>>,
}

impl NameLookup {
    fn fill(&self, cell: &mut GridCell, entry: &TimetableEntry, perspective: Perspective) {
        cell.subject = self.subjects.get(&entry.subject_id).cloned().flatten();
        match perspective {
            Perspective::Class => {
                cell.teacher = self.teachers.get(&entry.teacher_id).cloned().flatten();
            }
            Perspective::Teacher => {
                cell.class = self.classes.get(&entry.class_id).cloned().flatten();
            }
        }
        cell.room = entry.room.clone();
        cell.entry_id = Some(entry.id);
    }
}

#[cfg(test)]
#[path = "weekly_grid_tests.rs"]
mod tests;
