//! Persistence layer for time slots and timetable entries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (crate::services)                        │
//! │  - reference resolution                                 │
//! │  - overlap and double-booking pre-checks                │
//! │  - grid projection                                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - abstract interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐   ┌───────────▼───────────┐
//! │ LocalRepository  │   │ PostgresRepository    │
//! │ (in-memory)      │   │ (Diesel + r2d2)       │
//! └──────────────────┘   └───────────────────────┘
//! ```
//!
//! Both backends enforce the scheduling guards atomically with the write. The
//! service layer pre-checks the same rules to report which record collided.
//!
//! # Usage
//! ```ignore
//! use timetable_engine::db::{RepositoryFactory, RepositoryType};
//!
//! let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
//! let slots = repo.list_time_slots(SchoolId(1), true).await?;
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    DirectoryRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    TimeSlotRepository, TimetableEntryRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Build the repository the process should use.
///
/// A `repository.toml` in one of the standard locations wins; otherwise the
/// environment decides (see [`RepositoryType::from_env`]).
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    match RepositoryConfig::from_default_location() {
        Ok(config) => {
            log::info!(
                "Using repository type '{}' from repository.toml",
                config.repository.repo_type
            );
            RepositoryFactory::from_repository_config(&config).await
        }
        Err(_) => {
            log::info!("No repository.toml found; selecting repository from environment");
            RepositoryFactory::from_env().await
        }
    }
}

/// Initialize the global repository singleton.
///
/// Calling it again after a successful initialization is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = create_selected_repository()
        .await
        .context("Failed to initialize repository")?;
    // A concurrent initializer may have won; either instance is valid.
    let _ = REPOSITORY.set(repo);
    REPOSITORY
        .get()
        .context("Repository singleton unexpectedly empty after initialization")
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
