use super::*;
use crate::db::repositories::LocalRepository;
use crate::models::{
    Assignment, SchoolCalendar, SchoolClass, Subject, TimeSlot, User, UserRole,
};
use crate::services::time_slots::TimeSlotRegistry;
use crate::services::timetable::TimetableEntryStore;

const SCHOOL: SchoolId = SchoolId(1);
const C1: ClassId = ClassId(1);
const C2: ClassId = ClassId(2);
const MATH: SubjectId = SubjectId(1);
const T1: UserId = UserId(1);
const T2: UserId = UserId(2);

async fn seeded(calendar: SchoolCalendar) -> (LocalRepository, TimeSlot, TimeSlot) {
    let repo = LocalRepository::new();
    repo.add_school(School::new(SCHOOL, "Northside").with_calendar(calendar));
    repo.add_class(SchoolClass::new(C1, SCHOOL, "C1"));
    repo.add_class(SchoolClass::new(C2, SCHOOL, "C2"));
    repo.add_subject(Subject::new(MATH, SCHOOL, "Math"));
    repo.add_user(User::teacher(T1, SCHOOL, "Tara", "One"));
    repo.add_user(User::teacher(T2, SCHOOL, "Tom", "Two"));
    repo.add_user(User::new(UserId(3), SCHOOL, "Sam", "Student", UserRole::Student));

    let registry = TimeSlotRegistry::new(&repo);
    // Created out of display order on purpose.
    let second = registry
        .create_time_slot(SCHOOL, "08:45", "09:30", "Period2", 2)
        .await
        .unwrap();
    let first = registry
        .create_time_slot(SCHOOL, "08:00", "08:45", "Period1", 1)
        .await
        .unwrap();
    (repo, first, second)
}

fn lesson(class_id: ClassId, teacher_id: UserId, slot: &TimeSlot, day: DayOfWeek) -> Assignment {
    Assignment {
        class_id,
        subject_id: MATH,
        teacher_id,
        time_slot_id: slot.id,
        day,
        room: Some("B12".into()),
        notes: None,
    }
}

#[tokio::test]
async fn test_empty_grid_has_every_day_and_slot() {
    let (repo, first, second) = seeded(SchoolCalendar::FiveDay).await;
    let grid = WeeklyGridBuilder::new(&repo)
        .get_weekly_timetable(SCHOOL, C1)
        .await
        .unwrap();

    assert_eq!(
        grid.schedule.keys().copied().collect::<Vec<_>>(),
        DayOfWeek::WEEKDAYS.to_vec()
    );
    let ids: Vec<_> = grid.time_slots.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    for cells in grid.schedule.values() {
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(GridCell::is_empty));
        assert_eq!(cells[0].label, "Period1");
    }
    assert_eq!(
        grid.owner,
        GridOwner::Class(ClassSummary {
            id: C1,
            name: "C1".into()
        })
    );
}

#[tokio::test]
async fn test_seven_day_calendar() {
    let (repo, _, _) = seeded(SchoolCalendar::SevenDay).await;
    let grid = WeeklyGridBuilder::new(&repo)
        .get_weekly_timetable(SCHOOL, C1)
        .await
        .unwrap();

    assert_eq!(grid.schedule.len(), 7);
    assert!(grid.schedule.contains_key(&DayOfWeek::Sunday));
}

#[tokio::test]
async fn test_entries_are_overlaid_on_their_cell() {
    let (repo, first, second) = seeded(SchoolCalendar::FiveDay).await;
    let store = TimetableEntryStore::new(&repo);
    let entry = store
        .add_entry(SCHOOL, &lesson(C1, T1, &first, DayOfWeek::Monday))
        .await
        .unwrap();
    // Another class's lesson never shows up in C1's grid.
    store
        .add_entry(SCHOOL, &lesson(C2, T2, &second, DayOfWeek::Monday))
        .await
        .unwrap();

    let grid = WeeklyGridBuilder::new(&repo)
        .get_weekly_timetable(SCHOOL, C1)
        .await
        .unwrap();

    let cell = grid.cell(DayOfWeek::Monday, first.id).unwrap();
    assert_eq!(cell.subject.as_deref(), Some("Math"));
    assert_eq!(cell.teacher.as_deref(), Some("Tara One"));
    assert_eq!(cell.room.as_deref(), Some("B12"));
    assert_eq!(cell.entry_id, Some(entry.id));
    assert_eq!(cell.class, None);
    assert!(grid.cell(DayOfWeek::Monday, second.id).unwrap().is_empty());
    assert_eq!(grid.assigned_count(), 1);
}

#[tokio::test]
async fn test_grid_is_repeatable_and_hides_inactive_rows() {
    let (repo, first, second) = seeded(SchoolCalendar::FiveDay).await;
    let store = TimetableEntryStore::new(&repo);
    let dropped = store
        .add_entry(SCHOOL, &lesson(C1, T1, &second, DayOfWeek::Friday))
        .await
        .unwrap();
    store.deactivate_entry(SCHOOL, dropped.id).await.unwrap();
    TimeSlotRegistry::new(&repo)
        .delete_time_slot(SCHOOL, second.id)
        .await
        .unwrap();

    let builder = WeeklyGridBuilder::new(&repo);
    let once = builder.get_weekly_timetable(SCHOOL, C1).await.unwrap();
    let twice = builder.get_weekly_timetable(SCHOOL, C1).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(once.assigned_count(), 0);
    assert_eq!(once.time_slots.len(), 1);
    assert_eq!(once.time_slots[0].id, first.id);
}

#[tokio::test]
async fn test_teacher_grid_names_the_class() {
    let (repo, first, _) = seeded(SchoolCalendar::FiveDay).await;
    TimetableEntryStore::new(&repo)
        .add_entry(SCHOOL, &lesson(C2, T1, &first, DayOfWeek::Wednesday))
        .await
        .unwrap();

    let grid = WeeklyGridBuilder::new(&repo)
        .get_teacher_weekly_timetable(SCHOOL, T1)
        .await
        .unwrap();

    let cell = grid.cell(DayOfWeek::Wednesday, first.id).unwrap();
    assert_eq!(cell.class.as_deref(), Some("C2"));
    assert_eq!(cell.teacher, None);
    assert_eq!(
        grid.owner,
        GridOwner::Teacher(TeacherSummary {
            id: T1,
            name: "Tara One".into()
        })
    );
}

#[tokio::test]
async fn test_unknown_owner_is_not_found() {
    let (repo, _, _) = seeded(SchoolCalendar::FiveDay).await;
    let builder = WeeklyGridBuilder::new(&repo);

    assert!(builder
        .get_weekly_timetable(SCHOOL, ClassId(99))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(builder
        .get_weekly_timetable(SchoolId(9), C1)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(builder
        .get_teacher_weekly_timetable(SCHOOL, UserId(3))
        .await
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_grid_json_shape() {
    let now = chrono::Utc::now();
    let slot = TimeSlot {
        id: crate::models::TimeSlotId(1),
        school_id: SCHOOL,
        start_time: "08:00".parse().unwrap(),
        end_time: "08:45".parse().unwrap(),
        label: "Period1".into(),
        order: 1,
        status: crate::models::RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let mut schedule = BTreeMap::new();
    schedule.insert(DayOfWeek::Monday, vec![GridCell::empty(&slot)]);
    let grid = WeeklyTimetable {
        owner: GridOwner::Class(ClassSummary {
            id: C1,
            name: "C1".into(),
        }),
        time_slots: vec![GridSlot::from(&slot)],
        schedule,
    };

    let json = serde_json::to_value(&grid).unwrap();
    assert_eq!(json["class"]["name"], "C1");
    assert_eq!(json["timeSlots"][0]["startTime"], "08:00");
    let cell = &json["schedule"]["MONDAY"][0];
    assert_eq!(cell["timeSlotId"], 1);
    assert_eq!(cell["endTime"], "08:45");
    assert!(cell["subject"].is_null());
    assert!(cell["teacher"].is_null());
    assert!(cell["room"].is_null());
    assert!(cell.get("entryId").is_none());
}
