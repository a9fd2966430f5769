//! Time slot registry: validation, overlap detection and soft deletion.

use log::{info, warn};

use super::entity_validator::EntityValidator;
use super::error::{ConflictDetail, EntityKind, TimetableError, TimetableResult};
use crate::db::repository::FullRepository;
use crate::models::{
    NewTimeSlot, ParseTimeError, SchoolId, TimeOfDay, TimeRange, TimeSlot, TimeSlotId,
    TimeSlotPatch,
};

/// First active slot in `slots` overlapping `range`, skipping `exclude`.
pub fn find_overlap<'s>(
    slots: &'s [TimeSlot],
    range: &TimeRange,
    exclude: Option<TimeSlotId>,
) -> Option<&'s TimeSlot> {
    slots
        .iter()
        .filter(|slot| slot.is_active() && Some(slot.id) != exclude)
        .find(|slot| slot.range().overlaps(range))
}

/// Display order: `order`, then start time, then id.
pub(crate) fn sort_slots(slots: &mut [TimeSlot]) {
    slots.sort_by_key(|slot| (slot.order, slot.start_time, slot.id));
}

fn parse_time(field: &'static str, value: &str) -> TimetableResult<TimeOfDay> {
    value
        .parse()
        .map_err(|e: ParseTimeError| TimetableError::validation(field, e.to_string()))
}

fn checked_range(start: TimeOfDay, end: TimeOfDay) -> TimetableResult<TimeRange> {
    TimeRange::new(start, end).ok_or_else(|| {
        TimetableError::validation(
            "endTime",
            format!("end time {} must be after start time {}", end, start),
        )
    })
}

fn checked_label(label: &str) -> TimetableResult<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(TimetableError::validation("label", "label must not be empty"));
    }
    Ok(label.to_string())
}

fn checked_order(order: i32) -> TimetableResult<i32> {
    if order < 1 {
        return Err(TimetableError::validation(
            "order",
            format!("order must be a positive integer, got {}", order),
        ));
    }
    Ok(order)
}

fn overlap_error(other: &TimeSlot) -> TimetableError {
    TimetableError::Conflict(ConflictDetail::SlotOverlap {
        time_slot_id: other.id,
        label: other.label.clone(),
        start: other.start_time,
        end: other.end_time,
    })
}

/// Owns the per-school ordered set of time slots.
pub struct TimeSlotRegistry<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> TimeSlotRegistry<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Create an active slot `[start, end)` with a display label and order.
    ///
    /// # Errors
    /// * `Validation` - malformed time, `end <= start`, blank label or order < 1
    /// * `NotFound` - unknown school
    /// * `Conflict` - the range overlaps an active slot of the school
    pub async fn create_time_slot(
        &self,
        school_id: SchoolId,
        start: &str,
        end: &str,
        label: &str,
        order: i32,
    ) -> TimetableResult<TimeSlot> {
        let range = checked_range(parse_time("startTime", start)?, parse_time("endTime", end)?)?;
        let label = checked_label(label)?;
        let order = checked_order(order)?;

        EntityValidator::new(self.repo)
            .resolve_school(school_id)
            .await?;

        let active = self.repo.list_time_slots(school_id, true).await?;
        if let Some(other) = find_overlap(&active, &range, None) {
            warn!(
                "Rejected time slot {} for school {}: overlaps '{}' ({})",
                range,
                school_id,
                other.label,
                other.range()
            );
            return Err(overlap_error(other));
        }

        let slot = self
            .repo
            .insert_time_slot(&NewTimeSlot {
                school_id,
                range,
                label,
                order,
            })
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    warn!(
                        "Storage rejected time slot {} for school {}: {}",
                        range, school_id, e
                    );
                }
                TimetableError::from(e)
            })?;

        info!(
            "Created time slot {} '{}' ({}) for school {}",
            slot.id, slot.label, range, school_id
        );
        Ok(slot)
    }

    /// Apply a partial update to an active slot.
    ///
    /// Merged times are re-validated and checked for overlap against every
    /// other active slot of the school.
    pub async fn update_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
        patch: &TimeSlotPatch,
    ) -> TimetableResult<TimeSlot> {
        let new_start = patch
            .start_time
            .as_deref()
            .map(|value| parse_time("startTime", value))
            .transpose()?;
        let new_end = patch
            .end_time
            .as_deref()
            .map(|value| parse_time("endTime", value))
            .transpose()?;
        let new_label = patch.label.as_deref().map(checked_label).transpose()?;
        let new_order = patch.order.map(checked_order).transpose()?;

        let existing = self
            .repo
            .find_time_slot(school_id, time_slot_id)
            .await?
            .filter(TimeSlot::is_active)
            .ok_or_else(|| TimetableError::not_found(EntityKind::TimeSlot, time_slot_id))?;

        let range = checked_range(
            new_start.unwrap_or(existing.start_time),
            new_end.unwrap_or(existing.end_time),
        )?;

        if patch.touches_range() {
            let active = self.repo.list_time_slots(school_id, true).await?;
            if let Some(other) = find_overlap(&active, &range, Some(time_slot_id)) {
                warn!(
                    "Rejected update of time slot {} to {}: overlaps '{}' ({})",
                    time_slot_id,
                    range,
                    other.label,
                    other.range()
                );
                return Err(overlap_error(other));
            }
        }

        let merged = TimeSlot {
            start_time: range.start,
            end_time: range.end,
            label: new_label.unwrap_or_else(|| existing.label.clone()),
            order: new_order.unwrap_or(existing.order),
            ..existing
        };
        let updated = self.repo.update_time_slot(&merged).await?;

        info!("Updated time slot {} for school {}", updated.id, school_id);
        Ok(updated)
    }

    /// Soft-delete a slot that no active entry references.
    ///
    /// Deleting an already inactive slot returns it unchanged.
    pub async fn delete_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> TimetableResult<TimeSlot> {
        let existing = EntityValidator::new(self.repo)
            .resolve_time_slot(school_id, time_slot_id)
            .await?;
        if !existing.is_active() {
            return Ok(existing);
        }

        let active_entries = self
            .repo
            .count_active_entries_for_slot(school_id, time_slot_id)
            .await?;
        if active_entries > 0 {
            warn!(
                "Refused to delete time slot {}: {} active entries reference it",
                time_slot_id, active_entries
            );
            return Err(TimetableError::Conflict(ConflictDetail::SlotInUse {
                time_slot_id,
                active_entries,
            }));
        }

        let deactivated = self
            .repo
            .deactivate_time_slot(school_id, time_slot_id)
            .await?;
        info!("Deactivated time slot {} for school {}", time_slot_id, school_id);
        Ok(deactivated)
    }

    /// Active slots of the school in display order.
    pub async fn list_time_slots(&self, school_id: SchoolId) -> TimetableResult<Vec<TimeSlot>> {
        EntityValidator::new(self.repo)
            .resolve_school(school_id)
            .await?;

        let mut slots = self.repo.list_time_slots(school_id, true).await?;
        sort_slots(&mut slots);
        Ok(slots)
    }

    /// Any slot of the school, active or not.
    pub async fn get_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> TimetableResult<TimeSlot> {
        EntityValidator::new(self.repo)
            .resolve_time_slot(school_id, time_slot_id)
            .await
    }
}

#[cfg(test)]
#[path = "time_slots_tests.rs"]
mod tests;
