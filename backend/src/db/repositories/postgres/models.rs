use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{school_classes, schools, subjects, time_slots, timetable_entries, users};
use crate::db::repository::{entities, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    ClassId, EntryId, RecordStatus, School, SchoolClass, SchoolId, Subject, SubjectId, TimeOfDay,
    TimeSlot, TimeSlotId, TimetableEntry, User, UserId,
};

fn corrupt(entity: &str, id: i64, details: String) -> RepositoryError {
    RepositoryError::internal_with_context(
        format!("stored {} is malformed", entity),
        ErrorContext::new("decode_row")
            .with_entity(entity)
            .with_entity_id(id)
            .with_details(details),
    )
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SchoolRow {
    pub id: i64,
    pub name: String,
    pub calendar: String,
}

impl SchoolRow {
    pub fn into_domain(self) -> RepositoryResult<School> {
        let calendar = self
            .calendar
            .parse()
            .map_err(|e: String| corrupt(entities::SCHOOL, self.id, e))?;
        Ok(School::new(SchoolId(self.id), self.name).with_calendar(calendar))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = school_classes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SchoolClassRow {
    pub id: i64,
    pub school_id: i64,
    pub name: String,
}

impl From<SchoolClassRow> for SchoolClass {
    fn from(row: SchoolClassRow) -> Self {
        SchoolClass::new(ClassId(row.id), SchoolId(row.school_id), row.name)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubjectRow {
    pub id: i64,
    pub school_id: i64,
    pub name: String,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject::new(SubjectId(row.id), SchoolId(row.school_id), row.name)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub school_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl UserRow {
    pub fn into_domain(self) -> RepositoryResult<User> {
        let role = self
            .role
            .parse()
            .map_err(|e: String| corrupt(entities::USER, self.id, e))?;
        Ok(User::new(
            UserId(self.id),
            SchoolId(self.school_id),
            self.first_name,
            self.last_name,
            role,
        ))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeSlotRow {
    pub id: i64,
    pub school_id: i64,
    pub start_minute: i32,
    pub end_minute: i32,
    pub label: String,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlotRow {
    pub fn into_domain(self) -> RepositoryResult<TimeSlot> {
        let to_time = |minutes: i32| {
            u16::try_from(minutes)
                .ok()
                .and_then(TimeOfDay::from_minutes)
                .ok_or_else(|| {
                    corrupt(
                        entities::TIME_SLOT,
                        self.id,
                        format!("minute={} out of range", minutes),
                    )
                })
        };
        Ok(TimeSlot {
            id: TimeSlotId(self.id),
            school_id: SchoolId(self.school_id),
            start_time: to_time(self.start_minute)?,
            end_time: to_time(self.end_minute)?,
            label: self.label,
            order: self.sort_order,
            status: RecordStatus::from_active(self.active),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = time_slots)]
pub struct NewTimeSlotRow {
    pub school_id: i64,
    pub start_minute: i32,
    pub end_minute: i32,
    pub label: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = timetable_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimetableEntryRow {
    pub id: i64,
    pub school_id: i64,
    pub class_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub time_slot_id: i64,
    pub day: String,
    pub room: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimetableEntryRow {
    pub fn into_domain(self) -> RepositoryResult<TimetableEntry> {
        let day = self
            .day
            .parse()
            .map_err(|e: String| corrupt(entities::TIMETABLE_ENTRY, self.id, e))?;
        Ok(TimetableEntry {
            id: EntryId(self.id),
            school_id: SchoolId(self.school_id),
            class_id: ClassId(self.class_id),
            subject_id: SubjectId(self.subject_id),
            teacher_id: UserId(self.teacher_id),
            time_slot_id: TimeSlotId(self.time_slot_id),
            day,
            room: self.room,
            notes: self.notes,
            status: RecordStatus::from_active(self.active),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = timetable_entries)]
pub struct NewTimetableEntryRow {
    pub school_id: i64,
    pub class_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub time_slot_id: i64,
    pub day: String,
    pub room: Option<String>,
    pub notes: Option<String>,
}
