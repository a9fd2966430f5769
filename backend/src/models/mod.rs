//! Domain models for the timetable engine.

pub mod directory;
pub mod grid;
pub mod ids;
pub mod macros;
pub mod time;
pub mod timetable;

pub use directory::*;
pub use grid::*;
pub use ids::*;
pub use time::*;
pub use timetable::*;
