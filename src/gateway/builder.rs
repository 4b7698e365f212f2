//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use crate::cache::hotness::DEFAULT_WINDOW;
use crate::cache::{HotnessTracker, TierPolicy};
use crate::config::Config;
use crate::lookup::{DEFAULT_LOOKUP_TTL, LookupResolver};
use crate::providers::JikanClient;
use crate::providers::jikan::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::store::MemoryStore;
use crate::traits::{KeyValueStore, UpstreamFetcher};
use crate::{GatewayError, Result};

/// Main entry point for creating gateway instances.
pub struct Recogate;

impl Recogate {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> RecogateBuilder {
        RecogateBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct RecogateBuilder {
    jikan_url: Option<String>,
    timeout: Option<Duration>,
    redis_url: Option<String>,
    memory_capacity: Option<u64>,
    store: Option<Arc<dyn KeyValueStore>>,
    fetcher: Option<Arc<dyn UpstreamFetcher>>,
    tier_policy: TierPolicy,
    hotness_window: Duration,
    lookup_ttl: Duration,
}

impl RecogateBuilder {
    pub fn new() -> Self {
        Self {
            jikan_url: None,
            timeout: None,
            redis_url: None,
            memory_capacity: None,
            store: None,
            fetcher: None,
            tier_policy: TierPolicy::default(),
            hotness_window: DEFAULT_WINDOW,
            lookup_ttl: DEFAULT_LOOKUP_TTL,
        }
    }

    /// Start from a loaded [`Config`]. Later builder calls still override it.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .jikan_url(config.upstream.base_url.clone())
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .tier_policy(config.cache.tiers.clone())
            .hotness_window(Duration::from_secs(config.cache.hotness_window_secs))
            .lookup_ttl(Duration::from_secs(config.cache.lookup_ttl_secs));
        builder.memory_capacity = config.store.max_entries;
        if let Some(url) = &config.store.redis_url {
            builder = builder.redis_url(url.clone());
        }
        builder
    }

    /// Override the Jikan base URL (default: the public v4 API).
    pub fn jikan_url(mut self, url: impl Into<String>) -> Self {
        self.jikan_url = Some(url.into());
        self
    }

    /// Upstream request timeout (default: 10s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a shared redis store. Requires [`connect`](Self::connect).
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Use a caller-provided store, taking precedence over `redis_url`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a caller-provided upstream instead of the Jikan HTTP client.
    pub fn fetcher(mut self, fetcher: Arc<dyn UpstreamFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn tier_policy(mut self, policy: TierPolicy) -> Self {
        self.tier_policy = policy;
        self
    }

    /// Window of the hotness counters (default: 60s).
    pub fn hotness_window(mut self, window: Duration) -> Self {
        self.hotness_window = window;
        self
    }

    /// Lifetime of populated lookup tables (default: 10000s).
    pub fn lookup_ttl(mut self, ttl: Duration) -> Self {
        self.lookup_ttl = ttl;
        self
    }

    /// Build the gateway over an in-process store.
    ///
    /// Fails if a redis URL was configured without an explicit store, since
    /// connecting needs [`connect`](Self::connect).
    pub fn build(self) -> Result<Gateway> {
        let store = match (&self.store, &self.redis_url) {
            (Some(store), _) => store.clone(),
            (None, Some(_)) => {
                return Err(GatewayError::Configuration(
                    "a redis store needs RecogateBuilder::connect()".to_string(),
                ));
            }
            (None, None) => match self.memory_capacity {
                Some(max) => Arc::new(MemoryStore::with_max_entries(max)),
                None => Arc::new(MemoryStore::new()),
            },
        };
        self.assemble(store)
    }

    /// Connect the configured store and build the gateway.
    pub async fn connect(mut self) -> Result<Gateway> {
        if self.store.is_none()
            && let Some(url) = self.redis_url.take()
        {
            self.store = Some(connect_redis(&url).await?);
        }
        self.build()
    }

    fn assemble(self, store: Arc<dyn KeyValueStore>) -> Result<Gateway> {
        let fetcher: Arc<dyn UpstreamFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(JikanClient::with_base_url(
                self.jikan_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
                self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            )?),
        };

        let lookups = LookupResolver::new(store.clone(), fetcher.clone(), self.lookup_ttl);
        let hotness = HotnessTracker::new(store.clone(), self.hotness_window);

        Ok(Gateway::new(
            store,
            fetcher,
            lookups,
            hotness,
            self.tier_policy,
        ))
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> Result<Arc<dyn KeyValueStore>> {
    let store = crate::store::RedisStore::connect(url).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(url: &str) -> Result<Arc<dyn KeyValueStore>> {
    Err(GatewayError::Configuration(format!(
        "cannot connect to {url}: built without the `redis` feature"
    )))
}

impl Default for RecogateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults_to_memory_store() {
        assert!(Recogate::builder().build().is_ok());
    }

    #[test]
    fn redis_url_requires_connect() {
        let result = Recogate::builder().redis_url("redis://127.0.0.1:6379").build();
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn explicit_store_wins_over_redis_url() {
        let result = Recogate::builder()
            .redis_url("redis://127.0.0.1:6379")
            .store(Arc::new(MemoryStore::new()))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn from_config_without_redis_builds() {
        let config = Config::default();
        assert!(RecogateBuilder::from_config(&config).build().is_ok());
    }
}
