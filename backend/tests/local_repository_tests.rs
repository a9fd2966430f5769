//! Concurrency and guard tests for the in-memory repository.

mod support;

use std::sync::Arc;

use support::*;
use timetable_engine::db::repository::{TimeSlotRepository, TimetableEntryRepository};
use timetable_engine::models::{Assignment, DayOfWeek, NewTimeSlot, TimeRange, TimeSlotId};
use timetable_engine::services::{TimeSlotRegistry, TimetableEntryStore, TimetableError};

fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
}

#[tokio::test]
async fn test_concurrent_bookings_of_one_cell_admit_exactly_one() {
    let repo = Arc::new(seeded_repository());
    let slot = TimeSlotRegistry::new(repo.as_ref())
        .create_time_slot(SCHOOL, "08:00", "08:45", "Period1", 1)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for subject in [MATH, ENGLISH, SCIENCE, MATH, ENGLISH, SCIENCE] {
        let repo = Arc::clone(&repo);
        let request = Assignment {
            class_id: C1,
            subject_id: subject,
            teacher_id: T1,
            time_slot_id: slot.id,
            day: DayOfWeek::Thursday,
            room: None,
            notes: None,
        };
        handles.push(tokio::spawn(async move {
            TimetableEntryStore::new(repo.as_ref())
                .add_entry(SCHOOL, &request)
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(err.is_conflict(), "unexpected {err:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(repo.entry_count(), 1);
}

#[tokio::test]
async fn test_concurrent_overlapping_slots_admit_exactly_one() {
    let repo = Arc::new(seeded_repository());

    let mut handles = Vec::new();
    for (start, end) in [("08:00", "08:45"), ("08:30", "09:15"), ("08:40", "09:00")] {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            TimeSlotRegistry::new(repo.as_ref())
                .create_time_slot(SCHOOL, start, end, "Racer", 1)
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(repo.time_slot_count(), 1);
}

#[tokio::test]
async fn test_guard_rejection_surfaces_as_storage_conflict() {
    let repo = seeded_repository();
    repo.insert_time_slot(&NewTimeSlot {
        school_id: SCHOOL,
        range: range("08:00", "08:45"),
        label: "Period1".into(),
        order: 1,
    })
    .await
    .unwrap();

    // Straight to storage, skipping the registry's pre-check.
    let err: TimetableError = repo
        .insert_time_slot(&NewTimeSlot {
            school_id: SCHOOL,
            range: range("08:44", "09:00"),
            label: "Sneaky".into(),
            order: 2,
        })
        .await
        .unwrap_err()
        .into();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_deactivate_time_slot_guard() {
    let repo = seeded_repository();
    let slot = TimeSlotRegistry::new(&repo)
        .create_time_slot(SCHOOL, "08:00", "08:45", "Period1", 1)
        .await
        .unwrap();
    TimetableEntryStore::new(&repo)
        .add_entry(
            SCHOOL,
            &Assignment {
                class_id: C1,
                subject_id: MATH,
                teacher_id: T1,
                time_slot_id: slot.id,
                day: DayOfWeek::Monday,
                room: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = repo.deactivate_time_slot(SCHOOL, slot.id).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        repo.count_active_entries_for_slot(SCHOOL, slot.id)
            .await
            .unwrap(),
        1
    );
    assert!(repo
        .find_time_slot(SCHOOL, TimeSlotId(404))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unhealthy_repository_is_internal_error() {
    let repo = seeded_repository();
    repo.set_healthy(false);

    let err = TimeSlotRegistry::new(&repo)
        .list_time_slots(SCHOOL)
        .await
        .unwrap_err();
    match err {
        TimetableError::Internal(inner) => assert!(inner.is_retryable()),
        other => panic!("unexpected {other:?}"),
    }

    repo.set_healthy(true);
    assert!(TimeSlotRegistry::new(&repo)
        .list_time_slots(SCHOOL)
        .await
        .is_ok());
}
