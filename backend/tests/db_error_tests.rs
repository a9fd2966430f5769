//! Tests for db::repository::error and its mapping onto service errors.

use timetable_engine::db::repository::{entities, ErrorContext, RepositoryError};
use timetable_engine::services::{ConflictDetail, EntityKind, TimetableError};

#[test]
fn test_error_context_new() {
    let ctx = ErrorContext::new("test_operation");
    assert_eq!(ctx.operation, Some("test_operation".to_string()));
    assert!(ctx.entity.is_none());
    assert!(ctx.entity_id.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
}

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("insert_entry")
        .with_entity(entities::TIMETABLE_ENTRY)
        .with_entity_id(42)
        .with_details("axis=class")
        .retryable();

    assert_eq!(ctx.operation, Some("insert_entry".to_string()));
    assert_eq!(ctx.entity, Some("timetable_entry".to_string()));
    assert_eq!(ctx.entity_id, Some("42".to_string()));
    assert_eq!(ctx.details, Some("axis=class".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("deactivate_time_slot")
        .with_entity(entities::TIME_SLOT)
        .with_entity_id("7")
        .retryable();

    let display = format!("{}", ctx);
    assert!(display.contains("operation=deactivate_time_slot"));
    assert!(display.contains("entity=time_slot"));
    assert!(display.contains("id=7"));
    assert!(display.contains("retryable=true"));
}

#[test]
fn test_error_context_default() {
    let ctx = ErrorContext::default();
    assert!(ctx.operation.is_none());
    assert_eq!(format!("{}", ctx), "[]");
}

#[test]
fn test_retryable_variants() {
    assert!(RepositoryError::connection("pool exhausted").is_retryable());
    assert!(RepositoryError::timeout("slow").is_retryable());
    assert!(!RepositoryError::query("bad sql").is_retryable());
    assert!(!RepositoryError::conflict("taken").is_retryable());
    assert!(!RepositoryError::not_found("gone").is_retryable());
}

#[test]
fn test_message_and_context_accessors() {
    let err = RepositoryError::entity_not_found("find_entry", entities::TIMETABLE_ENTRY, 9);
    assert_eq!(err.message(), "timetable_entry 9 not found");
    assert_eq!(err.context().entity_id.as_deref(), Some("9"));
    assert!(err.to_string().starts_with("Not found:"));

    let err = err.with_operation("update_entry");
    assert_eq!(err.context().operation.as_deref(), Some("update_entry"));
}

#[test]
fn test_conflict_helpers() {
    let err = RepositoryError::conflict_with_context(
        "class already scheduled this period",
        ErrorContext::new("insert_entry").with_details("axis=class"),
    );
    assert!(err.is_conflict());
    assert!(err.to_string().contains("axis=class"));
    assert!(!RepositoryError::internal("boom").is_conflict());
}

#[test]
fn test_not_found_maps_to_entity_kind() {
    let cases = [
        (entities::SCHOOL, EntityKind::School),
        (entities::CLASS, EntityKind::Class),
        (entities::SUBJECT, EntityKind::Subject),
        (entities::USER, EntityKind::Teacher),
        (entities::TIME_SLOT, EntityKind::TimeSlot),
        (entities::TIMETABLE_ENTRY, EntityKind::Entry),
    ];
    for (entity, kind) in cases {
        let err: TimetableError = RepositoryError::entity_not_found("op", entity, 5).into();
        match err {
            TimetableError::NotFound { entity, id } => {
                assert_eq!(entity, kind);
                assert_eq!(id, "5");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    let bare: TimetableError = RepositoryError::not_found("Record not found").into();
    assert!(matches!(
        bare,
        TimetableError::NotFound {
            entity: EntityKind::Record,
            ..
        }
    ));
}

#[test]
fn test_storage_conflict_keeps_conflict_kind() {
    let err: TimetableError =
        RepositoryError::conflict("teacher already scheduled this period").into();
    assert_eq!(
        err.conflict_detail(),
        Some(&ConflictDetail::Storage {
            message: "teacher already scheduled this period".into()
        })
    );
}

#[test]
fn test_other_failures_are_internal() {
    let err: TimetableError = RepositoryError::connection("refused").into();
    assert!(matches!(err, TimetableError::Internal(ref inner) if inner.is_retryable()));

    let err: TimetableError = RepositoryError::validation("bad row").into();
    assert!(err.is_validation());
}
