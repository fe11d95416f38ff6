//! Redis-backed key-value store
//!
//! This module provides a [`KeyValueStore`] that keeps session state in
//! Redis, for kiosks and shared terminals where state must outlive the local
//! disk. Every key is prefixed with a namespace so several portals can share
//! one Redis instance.

use redis::{AsyncCommands, Client};
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key, separated by `:`
    pub namespace: String,
}

impl RedisConfig {
    /// Create a new RedisConfig
    pub fn new(url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: namespace.into(),
        }
    }
}

/// Redis key-value store
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    namespace: String,
}

impl RedisStore {
    /// Initialize a new Redis store
    pub async fn new(config: &RedisConfig) -> StoreResult<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Configuration("Redis URL is empty".to_string()));
        }
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisStore {
            client,
            namespace: config.namespace.clone(),
        })
    }

    /// Get a connection from the client
    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn namespaced(&self, key: &str) -> String {
        if self.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.namespace, key)
        }
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.namespaced(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.namespaced(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_namespaced_keys() -> StoreResult<()> {
        // Client::open only parses the URL, no connection is made
        let store = RedisStore::new(&RedisConfig::new("redis://localhost:6379", "renovar")).await?;
        assert_eq!(store.namespaced("authToken"), "renovar:authToken");

        let bare = RedisStore::new(&RedisConfig::new("redis://localhost:6379", "")).await?;
        assert_eq!(bare.namespaced("authToken"), "authToken");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let result = RedisStore::new(&RedisConfig::new("not a url", "renovar")).await;
        assert!(matches!(result, Err(StoreError::Redis(_))));

        let result = RedisStore::new(&RedisConfig::new("  ", "renovar")).await;
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_get_delete() -> StoreResult<()> {
        let config = RedisConfig::new("redis://localhost:6379", "renovar-test");
        let store = RedisStore::new(&config).await?;
        assert!(store.health_check().await?);

        let key = "test_key";
        store.set(key, "test_value").await?;
        assert_eq!(store.get(key).await?, Some("test_value".to_string()));

        store.delete(key).await?;
        assert_eq!(store.get(key).await?, None);

        Ok(())
    }
}
