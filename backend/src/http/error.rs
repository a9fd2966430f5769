//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::TimetableError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// A scheduling operation failed
    Timetable(TimetableError),
    /// Failure outside the service layer
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Timetable(TimetableError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppError::Timetable(TimetableError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Timetable(TimetableError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Timetable(TimetableError::Internal(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ApiError {
        match self {
            AppError::Timetable(err @ TimetableError::Validation { field, .. }) => {
                ApiError::new("VALIDATION_ERROR", err.to_string())
                    .with_details(json!({ "field": field }))
            }
            AppError::Timetable(err @ TimetableError::NotFound { entity, id }) => {
                ApiError::new("NOT_FOUND", err.to_string())
                    .with_details(json!({ "entity": entity, "id": id }))
            }
            AppError::Timetable(err @ TimetableError::Conflict(detail)) => {
                let api = ApiError::new("CONFLICT", err.to_string());
                match serde_json::to_value(detail) {
                    Ok(details) => api.with_details(details),
                    Err(_) => api,
                }
            }
            AppError::Timetable(err @ TimetableError::Internal(_)) => {
                ApiError::new("INTERNAL_ERROR", err.to_string())
            }
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<TimetableError> for AppError {
    fn from(err: TimetableError) -> Self {
        AppError::Timetable(err)
    }
}

impl From<crate::db::repository::RepositoryError> for AppError {
    fn from(err: crate::db::repository::RepositoryError) -> Self {
        AppError::Timetable(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryId, TimeSlotId};
    use crate::services::{ConflictDetail, EntityKind};

    #[test]
    fn test_status_per_variant() {
        let cases = [
            (TimetableError::validation("label", "empty"), StatusCode::BAD_REQUEST),
            (
                TimetableError::not_found(EntityKind::Class, 7),
                StatusCode::NOT_FOUND,
            ),
            (
                TimetableError::Conflict(ConflictDetail::SlotInUse {
                    time_slot_id: TimeSlotId(1),
                    active_entries: 2,
                }),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_body_carries_detail() {
        let err = AppError::from(TimetableError::Conflict(ConflictDetail::ClassBooked {
            entry_id: EntryId(4),
            day: crate::models::DayOfWeek::Monday,
            time_slot_id: TimeSlotId(1),
        }));
        let body = err.body();
        assert_eq!(body.code, "CONFLICT");
        let details = body.details.unwrap();
        assert_eq!(details["kind"], "class_booked");
        assert_eq!(details["entryId"], 4);
        assert_eq!(details["day"], "MONDAY");
    }

    #[test]
    fn test_not_found_body() {
        let body = AppError::from(TimetableError::not_found(EntityKind::Teacher, 3)).body();
        assert_eq!(body.code, "NOT_FOUND");
        assert_eq!(body.message, "teacher 3 not found");
        assert_eq!(body.details.unwrap()["entity"], "teacher");
    }
}
