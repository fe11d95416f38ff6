//! Portal configuration loaded from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use common::cache::{RedisConfig, RedisStore};
use common::store::{AnyStore, FileStore, MemoryStore};
use config::{Config, Environment};
use serde::Deserialize;
use tracing::info;

use crate::error::{PortalError, PortalResult};

/// Backend of the persisted key-value store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(PortalError::Configuration(format!(
                "unknown store backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    api_base_url: String,
    cep_lookup_url: String,
    store_backend: String,
    store_path: String,
    redis_url: String,
    redis_namespace: String,
    cep_debounce_ms: u64,
}

/// Portal configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Remote profile gateway base URL
    pub api_base_url: String,
    /// Postal-code lookup base URL
    pub cep_lookup_url: String,
    pub store_backend: StoreBackend,
    /// File backend location
    pub store_path: PathBuf,
    pub redis: RedisConfig,
    /// Quiet period before an auto-fill lookup, in milliseconds
    pub cep_debounce_ms: u64,
}

impl PortalConfig {
    /// Create a new PortalConfig from environment variables
    ///
    /// # Environment Variables
    /// - `RENOVAR_API_BASE_URL`: gateway base URL (default: http://localhost:8080)
    /// - `RENOVAR_CEP_LOOKUP_URL`: postal lookup base URL (default: https://viacep.com.br/ws)
    /// - `RENOVAR_STORE_BACKEND`: `memory`, `file` or `redis` (default: file)
    /// - `RENOVAR_STORE_PATH`: file backend path (default: .renovar/state.json)
    /// - `RENOVAR_REDIS_URL`: redis backend URL (default: redis://localhost:6379)
    /// - `RENOVAR_REDIS_NAMESPACE`: redis key prefix (default: renovar)
    /// - `RENOVAR_CEP_DEBOUNCE_MS`: auto-fill quiet period (default: 500)
    pub fn from_env() -> PortalResult<Self> {
        let raw: RawConfig = Config::builder()
            .set_default("api_base_url", "http://localhost:8080")
            .and_then(|b| b.set_default("cep_lookup_url", "https://viacep.com.br/ws"))
            .and_then(|b| b.set_default("store_backend", "file"))
            .and_then(|b| b.set_default("store_path", ".renovar/state.json"))
            .and_then(|b| b.set_default("redis_url", "redis://localhost:6379"))
            .and_then(|b| b.set_default("redis_namespace", "renovar"))
            .and_then(|b| b.set_default("cep_debounce_ms", 500))
            .map_err(config_error)?
            .add_source(Environment::with_prefix("RENOVAR").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        Ok(Self {
            api_base_url: raw.api_base_url,
            cep_lookup_url: raw.cep_lookup_url,
            store_backend: raw.store_backend.parse()?,
            store_path: PathBuf::from(raw.store_path),
            redis: RedisConfig::new(raw.redis_url, raw.redis_namespace),
            cep_debounce_ms: raw.cep_debounce_ms,
        })
    }

    pub fn cep_debounce(&self) -> Duration {
        Duration::from_millis(self.cep_debounce_ms)
    }

    /// Open the configured store backend
    pub async fn open_store(&self) -> PortalResult<AnyStore> {
        let store = match self.store_backend {
            StoreBackend::Memory => AnyStore::Memory(MemoryStore::new()),
            StoreBackend::File => AnyStore::File(FileStore::new(self.store_path.clone())),
            StoreBackend::Redis => AnyStore::Redis(RedisStore::new(&self.redis).await?),
        };
        info!("Using {:?} store backend", self.store_backend);
        Ok(store)
    }
}

fn config_error(e: config::ConfigError) -> PortalError {
    PortalError::Configuration(e.to_string())
}
