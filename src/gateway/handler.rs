//! The request path: canonicalize, resolve, track, probe, collapse, classify, store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::{
    CacheTier, Classification, HotnessSnapshot, HotnessTracker, ResponseShape, TierPolicy,
    canonicalize, request_identity,
};
use crate::collapse::RequestCollapser;
use crate::lookup::{LookupDomain, LookupResolver};
use crate::telemetry;
use crate::traits::{KeyValueStore, UpstreamFetcher};
use crate::types::{RecommendationRequest, Subject};
use crate::{GatewayError, Result};

/// Caching, collapsing front for the upstream recommendation API.
///
/// Built via [`Recogate::builder()`](super::Recogate::builder). Cheap to share
/// behind an `Arc`; every method takes `&self`.
pub struct Gateway {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn UpstreamFetcher>,
    lookups: LookupResolver,
    hotness: HotnessTracker,
    policy: TierPolicy,
    fetches: RequestCollapser<Value>,
}

impl Gateway {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn UpstreamFetcher>,
        lookups: LookupResolver,
        hotness: HotnessTracker,
        policy: TierPolicy,
    ) -> Self {
        Self {
            store,
            fetcher,
            lookups,
            hotness,
            policy,
            fetches: RequestCollapser::new(),
        }
    }

    /// Serve a recommendation request.
    ///
    /// Cached responses are returned from the first tier that holds them
    /// (and possibly re-tiered). On a full miss, one upstream fetch is shared
    /// by every concurrent caller with the same parameters, and its result is
    /// cached under the tier the classifier picks. Upstream failures are
    /// never cached.
    #[instrument(skip(self, request), fields(subject = %request.subject()))]
    pub async fn handle(&self, request: &RecommendationRequest) -> Result<Value> {
        request.validate()?;

        let mut query = request.to_query();
        let subject = query.subject;
        if !query.genres.is_empty() {
            let ids = self
                .lookups
                .resolve(&query.genres, LookupDomain::genres(subject))
                .await?;
            let joined: Vec<String> = ids.iter().map(i64::to_string).collect();
            query.params.insert("genres".to_string(), joined.join(","));
        }

        let key = canonicalize(&query.params);
        let identity = request_identity(subject, &key);
        let hotness = self.hotness.track(&identity, &query).await?;

        if let Some(value) = self.probe(&identity, &hotness).await {
            return Ok(value);
        }

        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        info!(%identity, "cache miss on every tier");

        let params: Vec<(String, String)> = query.params.into_iter().collect();
        self.fetches
            .run(&identity, || {
                self.fetch_and_store(subject, &identity, &params, &hotness)
            })
            .await
    }

    /// Check every tier, longest-lived first. Read failures count as misses.
    async fn probe(&self, identity: &str, hotness: &HotnessSnapshot) -> Option<Value> {
        for tier in CacheTier::PROBE_ORDER {
            let key = tier.key(identity);
            let bytes = match self.store.get(&key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!(%tier, "tier miss");
                    continue;
                }
                Err(e) => {
                    warn!(%key, error = %e, "cache read failed, treating as miss");
                    continue;
                }
            };

            let value: Value = match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!(%key, error = %e, "undecodable cache entry, treating as miss");
                    continue;
                }
            };

            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => tier.prefix()).increment(1);
            info!(%tier, "cache hit");

            let classification = self.policy.classify(&hotness.params, hotness.request, None);
            self.write_through(identity, &bytes, classification).await;
            return Some(value);
        }
        None
    }

    /// Copy a hit into the tier the classifier now picks and reset that
    /// entry's TTL. An existing entry in the target tier is kept.
    async fn write_through(&self, identity: &str, bytes: &[u8], classification: Classification) {
        let key = classification.tier.key(identity);
        let result = async {
            self.store
                .set_if_absent(&key, bytes, classification.ttl)
                .await?;
            self.store.expire(&key, classification.ttl).await?;
            Ok::<_, GatewayError>(())
        }
        .await;

        match result {
            Ok(()) => info!(
                %key,
                ttl_secs = classification.ttl.as_secs(),
                reason = classification.reason.as_str(),
                "cache entry refreshed"
            ),
            Err(e) => write_failed(&key, &e),
        }
    }

    /// The collapsed unit of work: fetch, classify on the fresh body, store.
    async fn fetch_and_store(
        &self,
        subject: Subject,
        identity: &str,
        params: &[(String, String)],
        hotness: &HotnessSnapshot,
    ) -> Result<Value> {
        let body = self.fetcher.fetch(subject.search_path(), params).await?;

        let shape = ResponseShape::of(&body);
        let classification = self
            .policy
            .classify(&hotness.params, hotness.request, Some(&shape));
        let key = classification.tier.key(identity);

        match serde_json::to_vec(&body) {
            Ok(bytes) => match self
                .store
                .set_if_absent(&key, &bytes, classification.ttl)
                .await
            {
                Ok(true) => info!(
                    %key,
                    ttl_secs = classification.ttl.as_secs(),
                    reason = classification.reason.as_str(),
                    "cached"
                ),
                // A racing classifier (possibly on another instance) got there first.
                Ok(false) => debug!(%key, "entry already present, keeping it"),
                Err(e) => write_failed(&key, &e),
            },
            Err(e) => write_failed(&key, &GatewayError::from(e)),
        }

        Ok(body)
    }
}

/// Cache writes are best effort: the fetched value is still returned.
fn write_failed(key: &str, error: &GatewayError) {
    metrics::counter!(telemetry::STORE_WRITE_FAILURES_TOTAL).increment(1);
    warn!(key, error = %error, "cache write failed, serving uncached");
}
