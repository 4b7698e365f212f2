//! Decaying-window hotness counters.
//!
//! Counters live in the shared [`KeyValueStore`] so every gateway instance
//! sees the same traffic. A counter's window starts when it is created and is
//! never extended by later increments; once it expires the next request
//! starts a fresh window at 1.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::Result;
use crate::traits::KeyValueStore;
use crate::types::SearchQuery;

/// Parameters whose individual values are tracked for hotness.
pub const TRACKED_PARAMS: &[&str] = &["status", "order_by", "genres", "type", "rating"];

/// Default hotness window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Hotness observed for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotnessSnapshot {
    /// Count for the exact request identity.
    pub request: i64,
    /// Count per tracked `name:value` pair present in the request.
    pub params: BTreeMap<String, i64>,
}

/// Increments request and parameter counters in the shared store.
pub struct HotnessTracker {
    store: Arc<dyn KeyValueStore>,
    window: Duration,
}

impl HotnessTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Increment `counter_key` and return the new count.
    ///
    /// The store attaches the window to the counter when it creates it, so
    /// steady traffic cannot keep pushing the window out and a counter never
    /// outlives it.
    pub async fn bump(&self, counter_key: &str) -> Result<i64> {
        self.store.increment(counter_key, self.window).await
    }

    /// Bump the request counter and every tracked parameter present in `query`.
    ///
    /// `query.params` must already hold resolved values so counters are
    /// keyed the same way the cache is.
    pub async fn track(&self, identity: &str, query: &SearchQuery) -> Result<HotnessSnapshot> {
        let request = self.bump(&request_counter_key(identity)).await?;

        let tracked: Vec<(String, String)> = TRACKED_PARAMS
            .iter()
            .filter_map(|name| {
                query
                    .params
                    .get(*name)
                    .map(|value| (format!("{name}:{value}"), param_counter_key(query.subject.as_str(), name, value)))
            })
            .collect();

        let counts = try_join_all(tracked.iter().map(|(_, key)| self.bump(key))).await?;
        let params: BTreeMap<String, i64> = tracked
            .into_iter()
            .map(|(label, _)| label)
            .zip(counts)
            .collect();

        debug!(identity, request, ?params, "hotness updated");
        Ok(HotnessSnapshot { request, params })
    }
}

/// Store key of the counter for a full request identity.
pub fn request_counter_key(identity: &str) -> String {
    format!("hot_request|{identity}")
}

/// Store key of the counter for one parameter value within a subject.
pub fn param_counter_key(subject: &str, name: &str, value: &str) -> String {
    format!("param_hotness|{subject}|{name}:{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{AnimeParams, AnimeStatus, OrderBy};

    fn tracker(window: Duration) -> (Arc<MemoryStore>, HotnessTracker) {
        let store = Arc::new(MemoryStore::new());
        let tracker = HotnessTracker::new(store.clone(), window);
        (store, tracker)
    }

    #[tokio::test]
    async fn bump_counts_up() {
        let (_, tracker) = tracker(DEFAULT_WINDOW);
        assert_eq!(tracker.bump("k").await.unwrap(), 1);
        assert_eq!(tracker.bump("k").await.unwrap(), 2);
        assert_eq!(tracker.bump("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_is_not_extended_by_later_bumps() {
        let (_, tracker) = tracker(Duration::from_millis(150));
        tracker.bump("k").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(tracker.bump("k").await.unwrap(), 2);
        tokio::time::sleep(Duration::from_millis(100)).await;
        // 200ms after creation: the first window has elapsed despite the bump at 100ms.
        assert_eq!(tracker.bump("k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn track_counts_only_present_tracked_params() {
        let (store, tracker) = tracker(DEFAULT_WINDOW);
        let query = AnimeParams::new()
            .status(AnimeStatus::Airing)
            .order_by(OrderBy::Score)
            .query("frieren")
            .to_query();

        let snapshot = tracker.track("anime?x", &query).await.unwrap();
        assert_eq!(snapshot.request, 1);
        assert_eq!(
            snapshot.params.keys().cloned().collect::<Vec<_>>(),
            vec!["order_by:score".to_string(), "status:airing".to_string()]
        );
        assert!(
            store
                .exists("param_hotness|anime|status:airing")
                .await
                .unwrap()
        );

        let again = tracker.track("anime?x", &query).await.unwrap();
        assert_eq!(again.request, 2);
        assert_eq!(again.params["status:airing"], 2);
    }
}
