//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Time slots
        .route(
            "/schools/{school_id}/time-slots",
            get(handlers::list_time_slots).post(handlers::create_time_slot),
        )
        .route(
            "/schools/{school_id}/time-slots/{time_slot_id}",
            get(handlers::get_time_slot)
                .patch(handlers::update_time_slot)
                .delete(handlers::delete_time_slot),
        )
        // Entries
        .route(
            "/schools/{school_id}/timetable",
            axum::routing::post(handlers::add_entry),
        )
        .route(
            "/schools/{school_id}/timetable/{entry_id}",
            get(handlers::get_entry)
                .patch(handlers::update_entry)
                .delete(handlers::deactivate_entry),
        )
        .route(
            "/schools/{school_id}/classes/{class_id}/entries",
            get(handlers::list_class_entries),
        )
        .route(
            "/schools/{school_id}/teachers/{teacher_id}/entries",
            get(handlers::list_teacher_entries),
        )
        // Weekly grids
        .route(
            "/schools/{school_id}/classes/{class_id}/timetable",
            get(handlers::get_weekly_timetable),
        )
        .route(
            "/schools/{school_id}/teachers/{teacher_id}/timetable",
            get(handlers::get_teacher_weekly_timetable),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
