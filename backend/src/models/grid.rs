//! Weekly grid projection types.

use serde::Serialize;
use std::collections::BTreeMap;

use super::ids::{ClassId, EntryId, TimeSlotId, UserId};
use super::time::TimeOfDay;
use super::timetable::{DayOfWeek, TimeSlot};

/// One (day, time slot) cell of a weekly grid.
///
/// `subject`, `teacher` and `room` serialize as `null` for an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub time_slot_id: TimeSlotId,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub label: String,
    pub subject: Option<String>,
    pub teacher: Option<String>,
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

impl GridCell {
    /// An unassigned cell for `slot`.
    pub fn empty(slot: &TimeSlot) -> Self {
        Self {
            time_slot_id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            label: slot.label.clone(),
            subject: None,
            teacher: None,
            room: None,
            class: None,
            entry_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_id.is_none()
    }
}

/// Slot column header of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSlot {
    pub id: TimeSlotId,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub label: String,
    pub order: i32,
}

impl From<&TimeSlot> for GridSlot {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            label: slot.label.clone(),
            order: slot.order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherSummary {
    pub id: UserId,
    pub name: String,
}

/// Whose week a grid shows. Serializes as a `class` or `teacher` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridOwner {
    Class(ClassSummary),
    Teacher(TeacherSummary),
}

/// A per-day, per-slot view of one class's (or teacher's) week.
///
/// `schedule` holds exactly the school's calendar days, in calendar order,
/// each with one cell per active time slot in slot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTimetable {
    #[serde(flatten)]
    pub owner: GridOwner,
    pub time_slots: Vec<GridSlot>,
    pub schedule: BTreeMap<DayOfWeek, Vec<GridCell>>,
}

impl WeeklyTimetable {
    pub fn cell(&self, day: DayOfWeek, time_slot_id: TimeSlotId) -> Option<&GridCell> {
        self.schedule
            .get(&day)?
            .iter()
            .find(|cell| cell.time_slot_id == time_slot_id)
    }

    /// Number of assigned cells across the week.
    pub fn assigned_count(&self) -> usize {
        self.schedule
            .values()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }
}
