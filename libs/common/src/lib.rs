//! Common library for the Renovar donor portal
//!
//! This crate provides the persisted key-value store that caches session
//! state between runs, with in-memory, file and Redis backends, and the
//! error type those backends share.

pub mod cache;
pub mod error;
pub mod store;

pub use cache::{RedisConfig, RedisStore};
pub use error::{StoreError, StoreResult};
pub use store::{AnyStore, FileStore, KeyValueStore, MemoryStore};
