//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::{TimeSlotRegistry, TimetableEntryStore, WeeklyGridBuilder};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    pub fn time_slots(&self) -> TimeSlotRegistry<'_, dyn FullRepository> {
        TimeSlotRegistry::new(self.repository.as_ref())
    }

    pub fn entries(&self) -> TimetableEntryStore<'_, dyn FullRepository> {
        TimetableEntryStore::new(self.repository.as_ref())
    }

    pub fn grids(&self) -> WeeklyGridBuilder<'_, dyn FullRepository> {
        WeeklyGridBuilder::new(self.repository.as_ref())
    }
}
