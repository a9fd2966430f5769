//! School-scoped resolution of directory and scheduling references.

use super::error::{EntityKind, TimetableError, TimetableResult};
use crate::db::repository::FullRepository;
use crate::models::{
    ClassId, School, SchoolClass, SchoolId, Subject, SubjectId, TimeSlot, TimeSlotId, User,
    UserId,
};

/// Read-only facade that turns ids into records of the requesting school.
///
/// A record that exists but belongs to another school is reported exactly
/// like a missing one. So is a user without the teacher role passed where a
/// teacher is expected.
pub struct EntityValidator<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> EntityValidator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn resolve_school(&self, school_id: SchoolId) -> TimetableResult<School> {
        self.repo
            .find_school(school_id)
            .await?
            .ok_or_else(|| TimetableError::not_found(EntityKind::School, school_id))
    }

    pub async fn resolve_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> TimetableResult<SchoolClass> {
        self.repo
            .find_class(school_id, class_id)
            .await?
            .ok_or_else(|| TimetableError::not_found(EntityKind::Class, class_id))
    }

    pub async fn resolve_subject(
        &self,
        school_id: SchoolId,
        subject_id: SubjectId,
    ) -> TimetableResult<Subject> {
        self.repo
            .find_subject(school_id, subject_id)
            .await?
            .ok_or_else(|| TimetableError::not_found(EntityKind::Subject, subject_id))
    }

    /// Resolve a user who must hold the teacher role.
    pub async fn resolve_teacher(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> TimetableResult<User> {
        self.repo
            .find_user(school_id, teacher_id)
            .await?
            .filter(User::is_teacher)
            .ok_or_else(|| TimetableError::not_found(EntityKind::Teacher, teacher_id))
    }

    /// Resolve a slot of the school, active or not.
    pub async fn resolve_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> TimetableResult<TimeSlot> {
        self.repo
            .find_time_slot(school_id, time_slot_id)
            .await?
            .ok_or_else(|| TimetableError::not_found(EntityKind::TimeSlot, time_slot_id))
    }

    /// Resolve a slot that can still receive new entries.
    pub async fn resolve_active_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> TimetableResult<TimeSlot> {
        let slot = self.resolve_time_slot(school_id, time_slot_id).await?;
        if !slot.is_active() {
            return Err(TimetableError::not_found(EntityKind::TimeSlot, time_slot_id));
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::TimeSlotRepository;
    use crate::models::{NewTimeSlot, TimeRange, UserRole};

    const SCHOOL: SchoolId = SchoolId(1);
    const OTHER_SCHOOL: SchoolId = SchoolId(2);

    fn seeded() -> LocalRepository {
        let repo = LocalRepository::new();
        repo.add_school(School::new(SCHOOL, "Northside"));
        repo.add_school(School::new(OTHER_SCHOOL, "Southside"));
        repo.add_class(SchoolClass::new(ClassId(1), SCHOOL, "C1"));
        repo.add_class(SchoolClass::new(ClassId(9), OTHER_SCHOOL, "Z9"));
        repo.add_subject(Subject::new(SubjectId(1), SCHOOL, "Math"));
        repo.add_user(User::teacher(UserId(1), SCHOOL, "Tess", "One"));
        repo.add_user(User::new(UserId(2), SCHOOL, "Sam", "Student", UserRole::Student));
        repo
    }

    #[tokio::test]
    async fn test_resolves_own_records() {
        let repo = seeded();
        let validator = EntityValidator::new(&repo);

        assert_eq!(validator.resolve_school(SCHOOL).await.unwrap().name, "Northside");
        assert_eq!(
            validator.resolve_class(SCHOOL, ClassId(1)).await.unwrap().name,
            "C1"
        );
        assert_eq!(
            validator
                .resolve_subject(SCHOOL, SubjectId(1))
                .await
                .unwrap()
                .name,
            "Math"
        );
        assert!(validator.resolve_teacher(SCHOOL, UserId(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_record_is_not_found() {
        let repo = seeded();
        let validator = EntityValidator::new(&repo);

        let err = validator.resolve_class(SCHOOL, ClassId(9)).await.unwrap_err();
        assert!(matches!(
            err,
            TimetableError::NotFound {
                entity: EntityKind::Class,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_non_teacher_is_reported_as_missing_teacher() {
        let repo = seeded();
        let validator = EntityValidator::new(&repo);

        let wrong_role = validator.resolve_teacher(SCHOOL, UserId(2)).await.unwrap_err();
        let missing = validator.resolve_teacher(SCHOOL, UserId(99)).await.unwrap_err();
        assert_eq!(wrong_role.to_string(), "teacher 2 not found");
        assert_eq!(missing.to_string(), "teacher 99 not found");
    }

    #[tokio::test]
    async fn test_inactive_slot_resolves_but_is_not_assignable() {
        let repo = seeded();
        let range = TimeRange::new("08:00".parse().unwrap(), "08:45".parse().unwrap()).unwrap();
        let slot = repo
            .insert_time_slot(&NewTimeSlot {
                school_id: SCHOOL,
                range,
                label: "Period1".into(),
                order: 1,
            })
            .await
            .unwrap();
        repo.deactivate_time_slot(SCHOOL, slot.id).await.unwrap();

        let validator = EntityValidator::new(&repo);
        assert!(validator.resolve_time_slot(SCHOOL, slot.id).await.is_ok());
        assert!(validator
            .resolve_active_time_slot(SCHOOL, slot.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal() {
        let repo = seeded();
        repo.set_healthy(false);
        let validator = EntityValidator::new(&repo);

        let err = validator.resolve_school(SCHOOL).await.unwrap_err();
        assert!(matches!(err, TimetableError::Internal(_)));
    }
}
