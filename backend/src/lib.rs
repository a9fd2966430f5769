//! # Timetable Engine
//!
//! School timetable scheduling: time slots, class/subject/teacher
//! assignments to weekday cells, and the conflict rules that keep a class
//! or a teacher from being booked twice in the same period.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Strongly typed ids, `HH:mm` times, slots, entries and grids
//! - [`db`]: Repository traits, the in-memory and PostgreSQL backends, factory and config
//! - [`services`]: Time slot registry, entry store, conflict detection and weekly grids
//! - `http`: Axum-based HTTP server and request handlers (feature `http-server`)
//!
//! Every operation takes the school id explicitly. Records of other schools
//! are indistinguishable from missing ones.

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
