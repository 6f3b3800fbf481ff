//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;

use crate::domain::entities::LinkRecord;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching an owner's canonical link list.
///
/// Implementations must be thread-safe and fail open: a broken cache degrades
/// to store lookups and never fails a request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached link list for an owner.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(links))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_links(&self, owner_id: &str) -> CacheResult<Option<Vec<LinkRecord>>>;

    /// Stores an owner's link list with optional TTL.
    ///
    /// `ttl_seconds = None` uses the implementation default.
    async fn set_links(
        &self,
        owner_id: &str,
        links: &[LinkRecord],
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Drops the cached list for an owner.
    ///
    /// Called after every successful reconciliation.
    async fn invalidate(&self, owner_id: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
