//! Link reconciliation and retrieval service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::entities::{LinkEntry, LinkRecord, Platform};
use crate::domain::reconcile::LinkChangeSet;
use crate::domain::repositories::LinkRepository;
use crate::domain::validation::{self, ValidationError};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Default number of retries for a batch hitting a transient store failure.
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Service applying link batches for one owner at a time.
///
/// Every operation takes the owner explicitly; there is no ambient session.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    retry_attempts: usize,
    /// Bumped by every write before cached lists are invalidated.
    write_epoch: AtomicU64,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            repository,
            cache,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            write_epoch: AtomicU64::new(0),
        }
    }

    /// Sets how many times a transient failure is retried (0 disables retries).
    pub fn with_retry_attempts(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Returns the owner's canonical link list.
    ///
    /// Served from cache when possible. A list read from the store is only
    /// cached if no write went through this service meanwhile; writes made
    /// by other instances can still leave a stale list for up to the cache
    /// TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `owner_id` is empty.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn list_links(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        validation::validate_owner(owner_id)?;

        if let Ok(Some(links)) = self.cache.get_links(owner_id).await {
            return Ok(links);
        }

        let epoch = self.write_epoch.load(Ordering::SeqCst);
        let links = self.repository.list_by_owner(owner_id).await?;

        if self.write_epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(owner_id, "Skipped caching a list read during a write");
            return Ok(links);
        }

        if let Err(e) = self.cache.set_links(owner_id, &links, None).await {
            tracing::warn!(error = %e, owner_id, "Failed to cache link list");
        }

        // A write may have invalidated between the check and the fill.
        if self.write_epoch.load(Ordering::SeqCst) != epoch {
            self.invalidate(owner_id).await;
        }

        Ok(links)
    }

    /// Applies one reconciliation batch: removals first, then upserts.
    ///
    /// The caller's entries are re-validated (required fields, URL syntax);
    /// duplicate platforms are not rejected here, the last one wins.
    /// The batch is atomic and idempotent, so transient store failures are
    /// retried with jittered exponential backoff.
    ///
    /// # Returns
    ///
    /// The records touched by the upserts, once each, in request order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed batch (nothing is written).
    /// Returns [`AppError::Unavailable`] if retries are exhausted.
    /// Returns [`AppError::Internal`] on other store errors.
    pub async fn apply(
        &self,
        owner_id: &str,
        entries: Vec<LinkEntry>,
        removals: Vec<String>,
    ) -> Result<Vec<LinkRecord>, AppError> {
        let upserts = validation::validate_owner(owner_id)
            .and_then(|_| validation::validate_entries(&entries))
            .inspect_err(|e: &ValidationError| {
                metrics::counter!("links_validation_failures_total").increment(1);
                tracing::info!(owner_id, reason = %e, "Rejected link batch");
            })?;

        let changes = LinkChangeSet::new(removals, upserts);

        let strategy = ExponentialBackoff::from_millis(2)
            .factor(10)
            .max_delay(Duration::from_millis(500))
            .map(jitter)
            .take(self.retry_attempts);

        let outcome = RetryIf::spawn(
            strategy,
            || self.repository.reconcile(owner_id, &changes),
            |e: &AppError| {
                let retry = e.is_retryable();
                if retry {
                    tracing::warn!(owner_id, error = %e, "Retrying link batch");
                }
                retry
            },
        )
        .await?;

        self.invalidate(owner_id).await;

        metrics::counter!("links_reconciled_total").increment(1);
        metrics::counter!("links_removed_total").increment(outcome.removed);
        metrics::counter!("links_upserted_total").increment(outcome.links.len() as u64);

        tracing::info!(
            owner_id,
            removed = outcome.removed,
            upserted = outcome.links.len(),
            "Applied link batch"
        );

        Ok(outcome.links)
    }

    /// Sets a single platform link for an owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the owner is empty or the url is invalid.
    pub async fn set_link(
        &self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError> {
        validation::validate_owner(owner_id)?;
        validation::validate_entries(&[LinkEntry::new(platform, url)])?;

        let record = self
            .repository
            .upsert_by_owner_platform(owner_id, platform, url)
            .await?;

        self.invalidate(owner_id).await;
        Ok(record)
    }

    /// Deletes the given links if `owner_id` owns them.
    ///
    /// Returns the number of deleted links; foreign identifiers count as zero.
    pub async fn remove_links(&self, owner_id: &str, ids: &[String]) -> Result<u64, AppError> {
        validation::validate_owner(owner_id)?;

        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self.repository.delete_where(ids, owner_id).await?;

        if deleted > 0 {
            self.invalidate(owner_id).await;
        }
        Ok(deleted)
    }

    /// Returns the owner's reverse index of link identifiers.
    pub async fn owner_index(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        validation::validate_owner(owner_id)?;
        self.repository.owner_index(owner_id).await
    }

    /// Reports store and cache reachability.
    pub async fn health(&self) -> (bool, bool) {
        let store = self.repository.health_check().await;
        let cache = self.cache.health_check().await;
        (store, cache)
    }

    async fn invalidate(&self, owner_id: &str) {
        self.write_epoch.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.cache.invalidate(owner_id).await {
            tracing::warn!(error = %e, owner_id, "Failed to invalidate cached links");
        }
    }
}

impl std::fmt::Debug for LinkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkService")
            .field("retry_attempts", &self.retry_attempts)
            .finish_non_exhaustive()
    }
}
