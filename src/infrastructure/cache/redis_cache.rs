//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::LinkRecord;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Redis cache of canonical link lists, one JSON value per owner.
///
/// Uses `ConnectionManager` for connection reuse. All operations are
/// fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::set_links`] is called
    ///   with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS` env var
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "links:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, owner_id: &str) -> String {
        format!("{}{}", self.key_prefix, owner_id)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_links(&self, owner_id: &str) -> CacheResult<Option<Vec<LinkRecord>>> {
        let key = self.build_key(owner_id);
        let mut conn = self.client.clone();

        let raw = match conn.get::<_, Option<String>>(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(owner_id, error = %e, "Redis GET error");
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            debug!(owner_id, "Cache MISS");
            return Ok(None);
        };

        match serde_json::from_str::<Vec<LinkRecord>>(&raw) {
            Ok(links) => {
                debug!(owner_id, count = links.len(), "Cache HIT");
                Ok(Some(links))
            }
            Err(e) => {
                warn!(owner_id, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn set_links(
        &self,
        owner_id: &str,
        links: &[LinkRecord],
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let key = self.build_key(owner_id);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl_seconds.unwrap_or(self.default_ttl);

        let payload = serde_json::to_string(links)
            .map_err(|e| CacheError::OperationError(format!("Failed to encode links: {}", e)))?;

        match conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds).await {
            Ok(_) => {
                debug!(owner_id, count = links.len(), ttl_seconds, "Cache SET");
                Ok(())
            }
            Err(e) => {
                warn!(owner_id, error = %e, "Redis SET error");
                Ok(())
            }
        }
    }

    async fn invalidate(&self, owner_id: &str) -> CacheResult<()> {
        let key = self.build_key(owner_id);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!(owner_id, "Cache INVALIDATE");
                }
                Ok(())
            }
            Err(e) => {
                warn!(owner_id, error = %e, "Redis DEL error");
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
