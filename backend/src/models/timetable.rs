//! Time slots, timetable entries and the values used to create or patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ClassId, EntryId, SchoolId, SubjectId, TimeSlotId, UserId};
use super::time::{TimeOfDay, TimeRange};

/// Day-of-week tag of a timetable entry.
///
/// Declaration order is calendar order, so `Ord` sorts Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub const WEEKDAYS: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    /// Symbolic name as exchanged with callers and stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown day of week: {}", s))
    }
}

/// Soft-delete state of a time slot or timetable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    pub fn from_active(active: bool) -> Self {
        if active {
            RecordStatus::Active
        } else {
            RecordStatus::Inactive
        }
    }
}

/// A named, ordered interval of a school's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub school_id: SchoolId,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub label: String,
    /// Display position. Not unique.
    pub order: i32,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    /// The slot's `[start, end)` range.
    ///
    /// Stored slots always satisfy `end > start`; a corrupted row degrades to
    /// an empty range at `start` that overlaps nothing.
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time).unwrap_or(TimeRange {
            start: self.start_time,
            end: self.start_time,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Validated input for inserting a new time slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeSlot {
    pub school_id: SchoolId,
    pub range: TimeRange,
    pub label: String,
    pub order: i32,
}

/// Partial update of a time slot. Times are raw `HH:mm` strings and are
/// validated by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotPatch {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl TimeSlotPatch {
    pub fn touches_range(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

/// An assignment of a subject and teacher to a class, time slot and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: EntryId,
    pub school_id: SchoolId,
    #[serde(rename = "class")]
    pub class_id: ClassId,
    #[serde(rename = "subject")]
    pub subject_id: SubjectId,
    #[serde(rename = "teacher")]
    pub teacher_id: UserId,
    #[serde(rename = "timeSlot")]
    pub time_slot_id: TimeSlotId,
    pub day: DayOfWeek,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimetableEntry {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Caller input for scheduling a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "class")]
    pub class_id: ClassId,
    #[serde(rename = "subject")]
    pub subject_id: SubjectId,
    #[serde(rename = "teacher")]
    pub teacher_id: UserId,
    #[serde(rename = "timeSlot")]
    pub time_slot_id: TimeSlotId,
    pub day: DayOfWeek,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated input for inserting a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimetableEntry {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: UserId,
    pub time_slot_id: TimeSlotId,
    pub day: DayOfWeek,
    pub room: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of an entry.
///
/// `room` and `notes` distinguish "leave unchanged" (`None`) from
/// "clear" (`Some(None)`); in JSON an absent key leaves the field alone and
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, rename = "subject")]
    pub subject_id: Option<SubjectId>,
    #[serde(default, rename = "teacher")]
    pub teacher_id: Option<UserId>,
    #[serde(default, rename = "timeSlot")]
    pub time_slot_id: Option<TimeSlotId>,
    #[serde(default)]
    pub day: Option<DayOfWeek>,
    #[serde(default, deserialize_with = "double_option")]
    pub room: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim free text and drop it when blank.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_parse_and_display() {
        assert_eq!("MONDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("friday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Friday);
        assert!("FUNDAY".parse::<DayOfWeek>().is_err());
        assert_eq!(DayOfWeek::Sunday.to_string(), "SUNDAY");
    }

    #[test]
    fn test_day_of_week_orders_monday_first() {
        let mut days = vec![DayOfWeek::Sunday, DayOfWeek::Wednesday, DayOfWeek::Monday];
        days.sort();
        assert_eq!(
            days,
            vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Sunday]
        );
    }

    #[test]
    fn test_day_of_week_serde() {
        assert_eq!(
            serde_json::to_string(&DayOfWeek::Thursday).unwrap(),
            "\"THURSDAY\""
        );
        let day: DayOfWeek = serde_json::from_str("\"SATURDAY\"").unwrap();
        assert_eq!(day, DayOfWeek::Saturday);
    }

    #[test]
    fn test_entry_patch_distinguishes_clear_from_absent() {
        let patch: EntryPatch = serde_json::from_str(r#"{"room": null}"#).unwrap();
        assert_eq!(patch.room, Some(None));
        assert_eq!(patch.notes, None);

        let patch: EntryPatch =
            serde_json::from_str(r#"{"notes": "lab", "timeSlot": 3, "day": "TUESDAY"}"#).unwrap();
        assert_eq!(patch.notes, Some(Some("lab".to_string())));
        assert_eq!(patch.time_slot_id, Some(TimeSlotId(3)));
        assert_eq!(patch.day, Some(DayOfWeek::Tuesday));
        assert_eq!(patch.room, None);
    }

    #[test]
    fn test_assignment_uses_reference_names() {
        let assignment: Assignment = serde_json::from_str(
            r#"{"class": 1, "subject": 2, "teacher": 3, "timeSlot": 4, "day": "MONDAY"}"#,
        )
        .unwrap();
        assert_eq!(assignment.class_id, ClassId(1));
        assert_eq!(assignment.teacher_id, UserId(3));
        assert!(assignment.room.is_none());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  B12 ".into())), Some("B12".into()));
        assert_eq!(normalize_text(Some("   ".into())), None);
        assert_eq!(normalize_text(None), None);
    }
}
