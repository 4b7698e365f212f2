//! Integration tests for lazily populated lookup tables.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::{Value, json};

use recogate::lookup::{LookupDomain, LookupResolver};
use recogate::store::MemoryStore;
use recogate::{GatewayError, KeyValueStore, Result, Subject, UpstreamFetcher};

/// Serves a fixed genre enumeration and counts calls.
struct EnumerationFetcher {
    calls: AtomicUsize,
    delay: Duration,
}

impl EnumerationFetcher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamFetcher for EnumerationFetcher {
    async fn fetch(&self, path: &str, _params: &[(String, String)]) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match path {
            "genres/anime" => Ok(json!({"data": [
                {"mal_id": 1, "name": "Action"},
                {"mal_id": 2, "name": "Adventure"},
                {"mal_id": 22, "name": "Romance"},
            ]})),
            other => Err(GatewayError::Upstream {
                status: 404,
                message: format!("no route {other}"),
            }),
        }
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn resolver(fetcher: Arc<EnumerationFetcher>, store: Arc<MemoryStore>) -> LookupResolver {
    LookupResolver::new(store, fetcher, Duration::from_secs(600))
}

#[tokio::test]
async fn resolves_case_insensitively_in_input_order() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let store = Arc::new(MemoryStore::new());
    let resolver = resolver(fetcher.clone(), store.clone());

    let ids = resolver
        .resolve(&labels(&["romance", "ACTION"]), LookupDomain::genres(Subject::Anime))
        .await
        .unwrap();

    assert_eq!(ids, vec![22, 1]);
    assert_eq!(
        store.hash_get("lookup:genres:anime", "adventure").await.unwrap(),
        Some("2".to_string())
    );
}

#[tokio::test]
async fn populated_table_is_reused() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let resolver = resolver(fetcher.clone(), Arc::new(MemoryStore::new()));
    let domain = LookupDomain::genres(Subject::Anime);

    resolver.resolve(&labels(&["Action"]), domain).await.unwrap();
    resolver.resolve(&labels(&["Adventure"]), domain).await.unwrap();
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn concurrent_cold_resolves_fetch_once() {
    let fetcher = EnumerationFetcher::new(Duration::from_millis(50));
    let resolver = resolver(fetcher.clone(), Arc::new(MemoryStore::new()));
    let domain = LookupDomain::genres(Subject::Anime);
    let wanted = labels(&["Action"]);

    let results = join_all((0..20).map(|_| resolver.resolve(&wanted, domain))).await;

    assert!(results.iter().all(|r| r.as_deref() == Ok(&[1][..])));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn unresolved_labels_are_all_named() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let resolver = resolver(fetcher, Arc::new(MemoryStore::new()));

    let err = resolver
        .resolve(
            &labels(&["Action", "Mecha", "Slice of Life"]),
            LookupDomain::genres(Subject::Anime),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Resolution {
            domain: "lookup:genres:anime".into(),
            labels: labels(&["Mecha", "Slice of Life"]),
        }
    );
    assert_eq!(
        err.to_string(),
        "unknown lookup:genres:anime label(s): Mecha, Slice of Life"
    );
}

#[tokio::test]
async fn existing_mappings_are_not_overwritten() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let store = Arc::new(MemoryStore::new());
    let resolver = resolver(fetcher.clone(), store.clone());

    // Table exists (written by another instance), with an extra mapping.
    store
        .hash_set_if_absent("lookup:genres:anime", "action", "99")
        .await
        .unwrap();

    let ids = resolver
        .resolve(&labels(&["Action"]), LookupDomain::genres(Subject::Anime))
        .await
        .unwrap();
    assert_eq!(ids, vec![99]);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn failed_population_propagates_and_is_retried() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let resolver = resolver(fetcher.clone(), Arc::new(MemoryStore::new()));
    let domain = LookupDomain::genres(Subject::Manga);

    for _ in 0..2 {
        let err = resolver.resolve(&labels(&["Drama"]), domain).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: 404, .. }));
    }
    assert_eq!(fetcher.calls(), 2);
}

/// Fails the second hash insert once, otherwise delegates to a `MemoryStore`.
struct FlakyHashStore {
    inner: MemoryStore,
    hash_writes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for FlakyHashStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool> {
        self.inner.set_if_absent(key, value, ttl).await
    }
    async fn increment(&self, key: &str, window: Duration) -> Result<i64> {
        self.inner.increment(key, window).await
    }
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.inner.expire(key, ttl).await
    }
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }
    async fn hash_set_if_absent(&self, table: &str, field: &str, value: &str) -> Result<bool> {
        if self.hash_writes.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(GatewayError::Store("connection reset".into()));
        }
        self.inner.hash_set_if_absent(table, field, value).await
    }
    async fn hash_get(&self, table: &str, field: &str) -> Result<Option<String>> {
        self.inner.hash_get(table, field).await
    }
}

#[tokio::test]
async fn partially_populated_table_still_expires() {
    let fetcher = EnumerationFetcher::new(Duration::ZERO);
    let store = Arc::new(FlakyHashStore {
        inner: MemoryStore::new(),
        hash_writes: AtomicUsize::new(0),
    });
    let resolver = LookupResolver::new(store.clone(), fetcher.clone(), Duration::from_millis(100));
    let domain = LookupDomain::genres(Subject::Anime);

    let err = resolver.resolve(&labels(&["Adventure"]), domain).await.unwrap_err();
    assert!(matches!(err, GatewayError::Store(_)));
    // Only "action" made it in before the failure.
    assert!(store.exists("lookup:genres:anime").await.unwrap());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!store.exists("lookup:genres:anime").await.unwrap());

    let ids = resolver.resolve(&labels(&["Adventure"]), domain).await.unwrap();
    assert_eq!(ids, vec![2]);
    assert_eq!(fetcher.calls(), 2);
}
