//! Repository trait for profile link storage.

use crate::domain::entities::{LinkRecord, Platform};
use crate::domain::reconcile::{LinkChangeSet, ReconcileOutcome};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for a user's profile links.
///
/// Records are addressable by identifier (removal path) and by
/// `(owner, platform)` (upsert path). The `(owner, platform)` pair is unique.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Lists the owner's links in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError>;

    /// Deletes the records in `ids` that belong to `owner_id`.
    ///
    /// Identifiers that are unknown or owned by someone else are skipped.
    /// Returns the number of deleted records.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_where(&self, ids: &[String], owner_id: &str) -> Result<u64, AppError>;

    /// Sets the url for `(owner_id, platform)`, creating the record if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn upsert_by_owner_platform(
        &self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError>;

    /// Returns the identifiers in the owner's reverse index.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn owner_index(&self, owner_id: &str) -> Result<Vec<String>, AppError>;

    /// Applies a whole batch atomically.
    ///
    /// Either every removal and upsert in `changes` is persisted or none is.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] or [`AppError::Conflict`] on transient
    /// failures that are safe to retry, [`AppError::Internal`] otherwise.
    async fn reconcile(
        &self,
        owner_id: &str,
        changes: &LinkChangeSet,
    ) -> Result<ReconcileOutcome, AppError>;

    /// Checks if the store is reachable.
    async fn health_check(&self) -> bool;
}
