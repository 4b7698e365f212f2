//! Collaborator traits consumed by the gateway core.
//!
//! The core never talks to reqwest or redis directly. It is handed an
//! [`UpstreamFetcher`] and a [`KeyValueStore`] at build time, which keeps the
//! request path testable with in-memory doubles.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Fetches JSON documents from the upstream API.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// GET `path` (relative to the upstream base URL) with query `params`.
    ///
    /// Implementations must surface failure statuses as
    /// [`GatewayError::Upstream`](crate::GatewayError::Upstream), including
    /// statuses embedded in an otherwise successful response body.
    async fn fetch(&self, path: &str, params: &[(String, String)]) -> Result<Value>;
}

/// Shared key-value store holding cache entries, hotness counters and lookup tables.
///
/// Mirrors the subset of redis semantics the gateway relies on. `increment`
/// and `set_if_absent` must be atomic across every process sharing the store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a plain value. `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a plain value, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Write a plain value only if the key does not exist.
    ///
    /// Returns `true` if this call created the key.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool>;

    /// Atomically increment an integer counter.
    ///
    /// A missing counter is created at 1 with `window` as its expiry, in the
    /// same atomic step. An existing counter's expiry is left untouched.
    async fn increment(&self, key: &str, window: Duration) -> Result<i64>;

    /// Set the expiry of an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Whether the key exists (any value kind).
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Set `field` in hash `table` only if the field is absent.
    ///
    /// Creates the table without expiry if it does not exist. Returns `true`
    /// if the field was written.
    async fn hash_set_if_absent(&self, table: &str, field: &str, value: &str) -> Result<bool>;

    /// Read `field` from hash `table`.
    async fn hash_get(&self, table: &str, field: &str) -> Result<Option<String>>;
}
