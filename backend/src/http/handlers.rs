//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for the scheduling rules.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    Assignment, CreateTimeSlotRequest, EntryPatch, HealthResponse, TimeSlotPatch,
    TimeSlotResponse, TimetableEntry, WeeklyTimetable,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::DirectoryRepository;
use crate::models::{ClassId, EntryId, SchoolId, TimeSlotId, UserId};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Time Slots
// =============================================================================

/// GET /v1/schools/{school_id}/time-slots
pub async fn list_time_slots(
    State(state): State<AppState>,
    Path(school_id): Path<SchoolId>,
) -> HandlerResult<Vec<TimeSlotResponse>> {
    let slots = state.time_slots().list_time_slots(school_id).await?;
    Ok(Json(slots.into_iter().map(Into::into).collect()))
}

/// POST /v1/schools/{school_id}/time-slots
pub async fn create_time_slot(
    State(state): State<AppState>,
    Path(school_id): Path<SchoolId>,
    Json(request): Json<CreateTimeSlotRequest>,
) -> CreatedResult<TimeSlotResponse> {
    let slot = state
        .time_slots()
        .create_time_slot(
            school_id,
            &request.start_time,
            &request.end_time,
            &request.label,
            request.order,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(slot.into())))
}

/// GET /v1/schools/{school_id}/time-slots/{time_slot_id}
pub async fn get_time_slot(
    State(state): State<AppState>,
    Path((school_id, time_slot_id)): Path<(SchoolId, TimeSlotId)>,
) -> HandlerResult<TimeSlotResponse> {
    let slot = state
        .time_slots()
        .get_time_slot(school_id, time_slot_id)
        .await?;
    Ok(Json(slot.into()))
}

/// PATCH /v1/schools/{school_id}/time-slots/{time_slot_id}
pub async fn update_time_slot(
    State(state): State<AppState>,
    Path((school_id, time_slot_id)): Path<(SchoolId, TimeSlotId)>,
    Json(patch): Json<TimeSlotPatch>,
) -> HandlerResult<TimeSlotResponse> {
    let slot = state
        .time_slots()
        .update_time_slot(school_id, time_slot_id, &patch)
        .await?;
    Ok(Json(slot.into()))
}

/// DELETE /v1/schools/{school_id}/time-slots/{time_slot_id}
///
/// Soft delete; refused with 409 while active entries use the slot.
pub async fn delete_time_slot(
    State(state): State<AppState>,
    Path((school_id, time_slot_id)): Path<(SchoolId, TimeSlotId)>,
) -> Result<StatusCode, AppError> {
    state
        .time_slots()
        .delete_time_slot(school_id, time_slot_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Timetable Entries
// =============================================================================

/// POST /v1/schools/{school_id}/timetable
pub async fn add_entry(
    State(state): State<AppState>,
    Path(school_id): Path<SchoolId>,
    Json(assignment): Json<Assignment>,
) -> CreatedResult<TimetableEntry> {
    let entry = state.entries().add_entry(school_id, &assignment).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/schools/{school_id}/timetable/{entry_id}
pub async fn get_entry(
    State(state): State<AppState>,
    Path((school_id, entry_id)): Path<(SchoolId, EntryId)>,
) -> HandlerResult<TimetableEntry> {
    Ok(Json(state.entries().get_entry(school_id, entry_id).await?))
}

/// PATCH /v1/schools/{school_id}/timetable/{entry_id}
pub async fn update_entry(
    State(state): State<AppState>,
    Path((school_id, entry_id)): Path<(SchoolId, EntryId)>,
    Json(patch): Json<EntryPatch>,
) -> HandlerResult<TimetableEntry> {
    let entry = state
        .entries()
        .update_entry(school_id, entry_id, &patch)
        .await?;
    Ok(Json(entry))
}

/// DELETE /v1/schools/{school_id}/timetable/{entry_id}
pub async fn deactivate_entry(
    State(state): State<AppState>,
    Path((school_id, entry_id)): Path<(SchoolId, EntryId)>,
) -> Result<StatusCode, AppError> {
    state
        .entries()
        .deactivate_entry(school_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/schools/{school_id}/classes/{class_id}/entries
pub async fn list_class_entries(
    State(state): State<AppState>,
    Path((school_id, class_id)): Path<(SchoolId, ClassId)>,
) -> HandlerResult<Vec<TimetableEntry>> {
    let entries = state
        .entries()
        .list_class_entries(school_id, class_id)
        .await?;
    Ok(Json(entries))
}

/// GET /v1/schools/{school_id}/teachers/{teacher_id}/entries
pub async fn list_teacher_entries(
    State(state): State<AppState>,
    Path((school_id, teacher_id)): Path<(SchoolId, UserId)>,
) -> HandlerResult<Vec<TimetableEntry>> {
    let entries = state
        .entries()
        .list_teacher_entries(school_id, teacher_id)
        .await?;
    Ok(Json(entries))
}

// =============================================================================
// Weekly Grids
// =============================================================================

/// GET /v1/schools/{school_id}/classes/{class_id}/timetable
pub async fn get_weekly_timetable(
    State(state): State<AppState>,
    Path((school_id, class_id)): Path<(SchoolId, ClassId)>,
) -> HandlerResult<WeeklyTimetable> {
    let grid = state
        .grids()
        .get_weekly_timetable(school_id, class_id)
        .await?;
    Ok(Json(grid))
}

/// GET /v1/schools/{school_id}/teachers/{teacher_id}/timetable
pub async fn get_teacher_weekly_timetable(
    State(state): State<AppState>,
    Path((school_id, teacher_id)): Path<(SchoolId, UserId)>,
) -> HandlerResult<WeeklyTimetable> {
    let grid = state
        .grids()
        .get_teacher_weekly_timetable(school_id, teacher_id)
        .await?;
    Ok(Json(grid))
}
