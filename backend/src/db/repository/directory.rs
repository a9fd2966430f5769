//! Directory lookups.
//!
//! Schools, classes, subjects and users belong to the surrounding system.
//! The engine reads them by id, always scoped to the calling school.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{ClassId, School, SchoolClass, SchoolId, Subject, SubjectId, User, UserId};

/// Read-only access to directory records.
///
/// Every lookup returns `Ok(None)` when the record is missing *or* belongs to
/// another school.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Check if the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>>;

    async fn find_class(
        &self,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> RepositoryResult<Option<SchoolClass>>;

    async fn find_subject(
        &self,
        school_id: SchoolId,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<Subject>>;

    /// Look up a user of any role.
    async fn find_user(&self, school_id: SchoolId, user_id: UserId)
        -> RepositoryResult<Option<User>>;
}
