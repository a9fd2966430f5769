//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against the schema created by
//! the embedded migrations under `migrations/`.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Scheduling guards
//!
//! The database itself enforces the scheduling invariants:
//! - `time_slots_no_overlap`: a btree_gist exclusion constraint over
//!   `int4range(start_minute, end_minute)` for active slots of one school
//! - `timetable_entries_class_slot_day_active` and
//!   `timetable_entries_teacher_slot_day_active`: partial unique indexes
//!   over active entries
//!
//! Writes also pre-check inside their transaction so that the common case
//! gets a descriptive conflict; the constraints catch the concurrent case.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::{
    entities, DirectoryRepository, ErrorContext, RepositoryError, RepositoryResult,
    TimeSlotRepository, TimetableEntryRepository,
};
use crate::models::{
    ClassId, DayOfWeek, EntryId, NewTimeSlot, NewTimetableEntry, School, SchoolClass, SchoolId,
    Subject, SubjectId, TimeSlot, TimeSlotId, TimetableEntry, User, UserId,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    ///
    /// Performs a simple query to verify connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}


fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn to_minute(time: crate::models::TimeOfDay) -> i32 {
    i32::from(time.minutes())
}

/// First active slot of the school intersecting `[start, end)`, ignoring `exclude`.
fn find_overlapping_slot(
    conn: &mut PgConnection,
    school_id: i64,
    start: i32,
    end: i32,
    exclude: Option<i64>,
) -> RepositoryResult<Option<TimeSlot>> {
    let mut query = time_slots::table
        .filter(time_slots::school_id.eq(school_id))
        .filter(time_slots::active.eq(true))
        .filter(time_slots::start_minute.lt(end))
        .filter(time_slots::end_minute.gt(start))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(time_slots::id.ne(id));
    }
    query
        .order(time_slots::sort_order.asc())
        .select(TimeSlotRow::as_select())
        .first::<TimeSlotRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .map(TimeSlotRow::into_domain)
        .transpose()
}

fn overlap_conflict(operation: &str, other: &TimeSlot) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("time slot overlaps '{}' ({})", other.label, other.range()),
        ErrorContext::new(operation)
            .with_entity(entities::TIME_SLOT)
            .with_entity_id(other.id),
    )
}

/// Take a shared lock on an active slot so it cannot be deactivated until
/// the surrounding transaction commits.
fn lock_active_slot(
    conn: &mut PgConnection,
    operation: &str,
    school_id: i64,
    time_slot_id: i64,
) -> RepositoryResult<()> {
    let locked = time_slots::table
        .filter(time_slots::id.eq(time_slot_id))
        .filter(time_slots::school_id.eq(school_id))
        .filter(time_slots::active.eq(true))
        .select(time_slots::id)
        .for_share()
        .first::<i64>(conn)
        .optional()
        .map_err(map_diesel_error)?;
    match locked {
        Some(_) => Ok(()),
        None => Err(RepositoryError::entity_not_found(
            operation,
            entities::TIME_SLOT,
            time_slot_id,
        )),
    }
}

/// Reject a placement that double-books the class or the teacher.
#[allow(clippy::too_many_arguments)]
fn check_bookings(
    conn: &mut PgConnection,
    operation: &str,
    school_id: i64,
    class_id: i64,
    teacher_id: i64,
    time_slot_id: i64,
    day: DayOfWeek,
    exclude: Option<i64>,
) -> RepositoryResult<()> {
    let mut query = timetable_entries::table
        .filter(timetable_entries::school_id.eq(school_id))
        .filter(timetable_entries::active.eq(true))
        .filter(timetable_entries::time_slot_id.eq(time_slot_id))
        .filter(timetable_entries::day.eq(day.as_str()))
        .filter(
            timetable_entries::class_id
                .eq(class_id)
                .or(timetable_entries::teacher_id.eq(teacher_id)),
        )
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(timetable_entries::id.ne(id));
    }
    let clash = query
        .select((timetable_entries::id, timetable_entries::class_id))
        .first::<(i64, i64)>(conn)
        .optional()
        .map_err(map_diesel_error)?;

    match clash {
        None => Ok(()),
        Some((other_id, other_class)) => {
            let axis = if other_class == class_id {
                "class"
            } else {
                "teacher"
            };
            Err(RepositoryError::conflict_with_context(
                format!("{} already booked for {} in slot {}", axis, day, time_slot_id),
                ErrorContext::new(operation)
                    .with_entity(entities::TIMETABLE_ENTRY)
                    .with_entity_id(other_id)
                    .with_details(format!("axis={}", axis)),
            ))
        }
    }
}

#[async_trait]
impl DirectoryRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>> {
        self.with_conn(move |conn| {
            schools::table
                .filter(schools::id.eq(school_id.value()))
                .select(SchoolRow::as_select())
                .first::<SchoolRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(SchoolRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn find_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Option<SchoolClass>> {
        self.with_conn(move |conn| {
            let row = school_classes::table
                .filter(school_classes::id.eq(class_id.value()))
                .filter(school_classes::school_id.eq(school_id.value()))
                .select(SchoolClassRow::as_select())
                .first::<SchoolClassRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(SchoolClass::from))
        })
        .await
    }

    async fn find_subject(
        &self,
        school_id: SchoolId,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<Subject>> {
        self.with_conn(move |conn| {
            let row = subjects::table
                .filter(subjects::id.eq(subject_id.value()))
                .filter(subjects::school_id.eq(school_id.value()))
                .select(SubjectRow::as_select())
                .first::<SubjectRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(Subject::from))
        })
        .await
    }

    async fn find_user(
        &self,
        school_id: SchoolId,
        user_id: UserId,
    ) -> RepositoryResult<Option<User>> {
        self.with_conn(move |conn| {
            users::table
                .filter(users::id.eq(user_id.value()))
                .filter(users::school_id.eq(school_id.value()))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(UserRow::into_domain)
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl TimeSlotRepository for PostgresRepository {
    async fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepositoryResult<TimeSlot> {
        let row = NewTimeSlotRow {
            school_id: slot.school_id.value(),
            start_minute: to_minute(slot.range.start),
            end_minute: to_minute(slot.range.end),
            label: slot.label.clone(),
            sort_order: slot.order,
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let overlap = find_overlapping_slot(
                    tx,
                    row.school_id,
                    row.start_minute,
                    row.end_minute,
                    None,
                )?;
                if let Some(other) = overlap {
                    return Err(overlap_conflict("insert_time_slot", &other));
                }

                diesel::insert_into(time_slots::table)
                    .values(&row)
                    .returning(TimeSlotRow::as_returning())
                    .get_result::<TimeSlotRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn update_time_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        let slot = slot.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let id = slot.id.value();
                let school_id = slot.school_id.value();
                let (start, end) = (to_minute(slot.start_time), to_minute(slot.end_time));

                let existing = time_slots::table
                    .filter(time_slots::id.eq(id))
                    .filter(time_slots::school_id.eq(school_id))
                    .select(TimeSlotRow::as_select())
                    .for_update()
                    .first::<TimeSlotRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        RepositoryError::entity_not_found(
                            "update_time_slot",
                            entities::TIME_SLOT,
                            id,
                        )
                    })?;

                if existing.active {
                    let overlap = find_overlapping_slot(tx, school_id, start, end, Some(id))?;
                    if let Some(other) = overlap {
                        return Err(overlap_conflict("update_time_slot", &other));
                    }
                }

                diesel::update(time_slots::table.filter(time_slots::id.eq(id)))
                    .set((
                        time_slots::start_minute.eq(start),
                        time_slots::end_minute.eq(end),
                        time_slots::label.eq(&slot.label),
                        time_slots::sort_order.eq(slot.order),
                        time_slots::updated_at.eq(Utc::now()),
                    ))
                    .returning(TimeSlotRow::as_returning())
                    .get_result::<TimeSlotRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn deactivate_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<TimeSlot> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let id = time_slot_id.value();
                let existing = time_slots::table
                    .filter(time_slots::id.eq(id))
                    .filter(time_slots::school_id.eq(school_id.value()))
                    .select(TimeSlotRow::as_select())
                    .for_update()
                    .first::<TimeSlotRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        RepositoryError::entity_not_found(
                            "deactivate_time_slot",
                            entities::TIME_SLOT,
                            id,
                        )
                    })?;
                if !existing.active {
                    return existing.into_domain();
                }

                let in_use: i64 = timetable_entries::table
                    .filter(timetable_entries::time_slot_id.eq(id))
                    .filter(timetable_entries::active.eq(true))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if in_use > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!(
                            "time slot {} is referenced by {} active entries",
                            time_slot_id, in_use
                        ),
                        ErrorContext::new("deactivate_time_slot")
                            .with_entity(entities::TIME_SLOT)
                            .with_entity_id(id),
                    ));
                }

                diesel::update(time_slots::table.filter(time_slots::id.eq(id)))
                    .set((
                        time_slots::active.eq(false),
                        time_slots::updated_at.eq(Utc::now()),
                    ))
                    .returning(TimeSlotRow::as_returning())
                    .get_result::<TimeSlotRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn find_time_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<Option<TimeSlot>> {
        self.with_conn(move |conn| {
            time_slots::table
                .filter(time_slots::id.eq(time_slot_id.value()))
                .filter(time_slots::school_id.eq(school_id.value()))
                .select(TimeSlotRow::as_select())
                .first::<TimeSlotRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(TimeSlotRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_time_slots(
        &self,
        school_id: SchoolId,
        active_only: bool,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        self.with_conn(move |conn| {
            let mut query = time_slots::table
                .filter(time_slots::school_id.eq(school_id.value()))
                .into_boxed();
            if active_only {
                query = query.filter(time_slots::active.eq(true));
            }
            query
                .order((
                    time_slots::sort_order.asc(),
                    time_slots::start_minute.asc(),
                    time_slots::id.asc(),
                ))
                .select(TimeSlotRow::as_select())
                .load::<TimeSlotRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(TimeSlotRow::into_domain)
                .collect()
        })
        .await
    }
}

fn load_entries(
    conn: &mut PgConnection,
    query: timetable_entries::BoxedQuery<'static, diesel::pg::Pg>,
) -> RepositoryResult<Vec<TimetableEntry>> {
    query
        .filter(timetable_entries::active.eq(true))
        .order(timetable_entries::id.asc())
        .select(TimetableEntryRow::as_select())
        .load::<TimetableEntryRow>(conn)
        .map_err(map_diesel_error)?
        .into_iter()
        .map(TimetableEntryRow::into_domain)
        .collect()
}

fn find_active_entry(
    conn: &mut PgConnection,
    query: timetable_entries::BoxedQuery<'static, diesel::pg::Pg>,
) -> RepositoryResult<Option<TimetableEntry>> {
    query
        .filter(timetable_entries::active.eq(true))
        .select(TimetableEntryRow::as_select())
        .first::<TimetableEntryRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .map(TimetableEntryRow::into_domain)
        .transpose()
}

#[async_trait]
impl TimetableEntryRepository for PostgresRepository {
    async fn insert_entry(&self, entry: &NewTimetableEntry) -> RepositoryResult<TimetableEntry> {
        let day = entry.day;
        let row = NewTimetableEntryRow {
            school_id: entry.school_id.value(),
            class_id: entry.class_id.value(),
            subject_id: entry.subject_id.value(),
            teacher_id: entry.teacher_id.value(),
            time_slot_id: entry.time_slot_id.value(),
            day: day.as_str().to_string(),
            room: entry.room.clone(),
            notes: entry.notes.clone(),
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                lock_active_slot(tx, "insert_entry", row.school_id, row.time_slot_id)?;
                check_bookings(
                    tx,
                    "insert_entry",
                    row.school_id,
                    row.class_id,
                    row.teacher_id,
                    row.time_slot_id,
                    day,
                    None,
                )?;

                diesel::insert_into(timetable_entries::table)
                    .values(&row)
                    .returning(TimetableEntryRow::as_returning())
                    .get_result::<TimetableEntryRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn update_entry(&self, entry: &TimetableEntry) -> RepositoryResult<TimetableEntry> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let id = entry.id.value();
                let school_id = entry.school_id.value();
                let existing = timetable_entries::table
                    .filter(timetable_entries::id.eq(id))
                    .filter(timetable_entries::school_id.eq(school_id))
                    .filter(timetable_entries::active.eq(true))
                    .select(TimetableEntryRow::as_select())
                    .for_update()
                    .first::<TimetableEntryRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        RepositoryError::entity_not_found(
                            "update_entry",
                            entities::TIMETABLE_ENTRY,
                            id,
                        )
                    })?;

                let time_slot_id = entry.time_slot_id.value();
                if existing.time_slot_id != time_slot_id {
                    lock_active_slot(tx, "update_entry", school_id, time_slot_id)?;
                }
                check_bookings(
                    tx,
                    "update_entry",
                    school_id,
                    existing.class_id,
                    entry.teacher_id.value(),
                    time_slot_id,
                    entry.day,
                    Some(id),
                )?;

                diesel::update(timetable_entries::table.filter(timetable_entries::id.eq(id)))
                    .set((
                        timetable_entries::subject_id.eq(entry.subject_id.value()),
                        timetable_entries::teacher_id.eq(entry.teacher_id.value()),
                        timetable_entries::time_slot_id.eq(time_slot_id),
                        timetable_entries::day.eq(entry.day.as_str()),
                        timetable_entries::room.eq(entry.room.as_deref()),
                        timetable_entries::notes.eq(entry.notes.as_deref()),
                        timetable_entries::updated_at.eq(Utc::now()),
                    ))
                    .returning(TimetableEntryRow::as_returning())
                    .get_result::<TimetableEntryRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn deactivate_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<TimetableEntry> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let id = entry_id.value();
                let existing = timetable_entries::table
                    .filter(timetable_entries::id.eq(id))
                    .filter(timetable_entries::school_id.eq(school_id.value()))
                    .select(TimetableEntryRow::as_select())
                    .for_update()
                    .first::<TimetableEntryRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        RepositoryError::entity_not_found(
                            "deactivate_entry",
                            entities::TIMETABLE_ENTRY,
                            id,
                        )
                    })?;
                if !existing.active {
                    return existing.into_domain();
                }

                diesel::update(timetable_entries::table.filter(timetable_entries::id.eq(id)))
                    .set((
                        timetable_entries::active.eq(false),
                        timetable_entries::updated_at.eq(Utc::now()),
                    ))
                    .returning(TimetableEntryRow::as_returning())
                    .get_result::<TimetableEntryRow>(tx)
                    .map_err(map_diesel_error)?
                    .into_domain()
            })
        })
        .await
    }

    async fn find_entry(
        &self,
        school_id: SchoolId,
        entry_id: EntryId,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        self.with_conn(move |conn| {
            timetable_entries::table
                .filter(timetable_entries::id.eq(entry_id.value()))
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .select(TimetableEntryRow::as_select())
                .first::<TimetableEntryRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(TimetableEntryRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn find_active_by_class_slot_day(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        self.with_conn(move |conn| {
            let query = timetable_entries::table
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .filter(timetable_entries::class_id.eq(class_id.value()))
                .filter(timetable_entries::time_slot_id.eq(time_slot_id.value()))
                .filter(timetable_entries::day.eq(day.as_str()))
                .into_boxed();
            find_active_entry(conn, query)
        })
        .await
    }

    async fn find_active_by_teacher_slot_day(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<TimetableEntry>> {
        self.with_conn(move |conn| {
            let query = timetable_entries::table
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .filter(timetable_entries::teacher_id.eq(teacher_id.value()))
                .filter(timetable_entries::time_slot_id.eq(time_slot_id.value()))
                .filter(timetable_entries::day.eq(day.as_str()))
                .into_boxed();
            find_active_entry(conn, query)
        })
        .await
    }

    async fn list_active_entries_for_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TimetableEntry>> {
        self.with_conn(move |conn| {
            let query = timetable_entries::table
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .filter(timetable_entries::class_id.eq(class_id.value()))
                .into_boxed();
            load_entries(conn, query)
        })
        .await
    }

    async fn list_active_entries_for_teacher(
        &self,
        school_id: SchoolId,
        teacher_id: UserId,
    ) -> RepositoryResult<Vec<TimetableEntry>> {
        self.with_conn(move |conn| {
            let query = timetable_entries::table
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .filter(timetable_entries::teacher_id.eq(teacher_id.value()))
                .into_boxed();
            load_entries(conn, query)
        })
        .await
    }

    async fn count_active_entries_for_slot(
        &self,
        school_id: SchoolId,
        time_slot_id: TimeSlotId,
    ) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            let count: i64 = timetable_entries::table
                .filter(timetable_entries::school_id.eq(school_id.value()))
                .filter(timetable_entries::time_slot_id.eq(time_slot_id.value()))
                .filter(timetable_entries::active.eq(true))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(count as usize)
        })
        .await
    }
}
