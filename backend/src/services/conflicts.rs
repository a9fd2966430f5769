//! Double-booking detection on the class and teacher axes.

use super::error::{ConflictDetail, TimetableError, TimetableResult};
use crate::db::repository::FullRepository;
use crate::models::{ClassId, DayOfWeek, EntryId, SchoolId, TimeSlotId, TimetableEntry, UserId};

/// A prospective placement of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub class_id: ClassId,
    pub teacher_id: UserId,
    pub time_slot_id: TimeSlotId,
    pub day: DayOfWeek,
}

/// Finds active entries that already occupy a (slot, day) cell.
pub struct ConflictDetector<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> ConflictDetector<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// The active entry holding `(class, slot, day)`, unless it is `exclude`.
    pub async fn find_class_conflict(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
        exclude: Option<EntryId>,
    ) -> TimetableResult<Option<TimetableEntry>> {
        let found = self
            .repo
            .find_active_by_class_slot_day(school_id, class_id, time_slot_id, day)
            .await?;
        Ok(found.filter(|entry| Some(entry.id) != exclude))
    }

    /// The active entry holding `(teacher, slot, day)`, unless it is `exclude`.
    pub async fn find_teacher_conflict(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
        exclude: Option<EntryId>,
    ) -> TimetableResult<Option<TimetableEntry>> {
        let found = self
            .repo
            .find_active_by_teacher_slot_day(school_id, teacher_id, time_slot_id, day)
            .await?;
        Ok(found.filter(|entry| Some(entry.id) != exclude))
    }

    /// Check both axes, class first.
    pub async fn check(
        &self,
        school_id: SchoolId,
        placement: &Placement,
        exclude: Option<EntryId>,
    ) -> TimetableResult<()> {
        if let Some(entry) = self
            .find_class_conflict(
                school_id,
                placement.class_id,
                placement.time_slot_id,
                placement.day,
                exclude,
            )
            .await?
        {
            return Err(TimetableError::Conflict(ConflictDetail::ClassBooked {
                entry_id: entry.id,
                day: entry.day,
                time_slot_id: entry.time_slot_id,
            }));
        }
        self.check_teacher(school_id, placement, exclude).await
    }

    /// Check the teacher axis only.
    pub async fn check_teacher(
        &self,
        school_id: SchoolId,
        placement: &Placement,
        exclude: Option<EntryId>,
    ) -> TimetableResult<()> {
        match self
            .find_teacher_conflict(
                school_id,
                placement.teacher_id,
                placement.time_slot_id,
                placement.day,
                exclude,
            )
            .await?
        {
            Some(entry) => Err(TimetableError::Conflict(ConflictDetail::TeacherBooked {
                entry_id: entry.id,
                day: entry.day,
                time_slot_id: entry.time_slot_id,
            })),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{TimeSlotRepository, TimetableEntryRepository};
    use crate::models::{NewTimeSlot, NewTimetableEntry, SubjectId, TimeRange};

    const SCHOOL: SchoolId = SchoolId(1);

    async fn setup() -> (LocalRepository, TimeSlotId, TimetableEntry) {
        let repo = LocalRepository::new();
        let slot = repo
            .insert_time_slot(&NewTimeSlot {
                school_id: SCHOOL,
                range: TimeRange::new("08:00".parse().unwrap(), "08:45".parse().unwrap())
                    .unwrap(),
                label: "Period1".into(),
                order: 1,
            })
            .await
            .unwrap();
        let entry = repo
            .insert_entry(&NewTimetableEntry {
                school_id: SCHOOL,
                class_id: ClassId(1),
                subject_id: SubjectId(1),
                teacher_id: UserId(1),
                time_slot_id: slot.id,
                day: DayOfWeek::Monday,
                room: None,
                notes: None,
            })
            .await
            .unwrap();
        (repo, slot.id, entry)
    }

    fn placement(class: i64, teacher: i64, slot: TimeSlotId, day: DayOfWeek) -> Placement {
        Placement {
            class_id: ClassId(class),
            teacher_id: UserId(teacher),
            time_slot_id: slot,
            day,
        }
    }

    #[tokio::test]
    async fn test_class_axis_reported_first() {
        let (repo, slot, entry) = setup().await;
        let detector = ConflictDetector::new(&repo);

        let err = detector
            .check(SCHOOL, &placement(1, 1, slot, DayOfWeek::Monday), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.conflict_detail(),
            Some(&ConflictDetail::ClassBooked {
                entry_id: entry.id,
                day: DayOfWeek::Monday,
                time_slot_id: slot,
            })
        );
    }

    #[tokio::test]
    async fn test_teacher_axis() {
        let (repo, slot, entry) = setup().await;
        let detector = ConflictDetector::new(&repo);

        let err = detector
            .check(SCHOOL, &placement(2, 1, slot, DayOfWeek::Monday), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.conflict_detail(),
            Some(ConflictDetail::TeacherBooked { entry_id, .. }) if *entry_id == entry.id
        ));
    }

    #[tokio::test]
    async fn test_self_is_excluded() {
        let (repo, slot, entry) = setup().await;
        let detector = ConflictDetector::new(&repo);

        assert!(detector
            .check(
                SCHOOL,
                &placement(1, 1, slot, DayOfWeek::Monday),
                Some(entry.id)
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_other_day_or_school_is_free() {
        let (repo, slot, _) = setup().await;
        let detector = ConflictDetector::new(&repo);

        assert!(detector
            .check(SCHOOL, &placement(1, 1, slot, DayOfWeek::Tuesday), None)
            .await
            .is_ok());
        assert!(detector
            .find_class_conflict(SchoolId(2), ClassId(1), slot, DayOfWeek::Monday, None)
            .await
            .unwrap()
            .is_none());
    }
}
