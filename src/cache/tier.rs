//! Cache tier selection.
//!
//! [`TierPolicy::classify`] is a pure decision function: hotness signals plus
//! (optionally) the shape of a fresh upstream response go in, a tier and TTL
//! come out. It is run on the fetch path and again on every cache hit so an
//! entry can be promoted while it is being served.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::CacheTier;

/// Why a tier was chosen. Logged alongside every cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierReason {
    /// The exact request was seen often within its hotness window.
    HotRequest,
    /// The upstream returned no results.
    NegativeCache,
    /// The request is built from frequently used filter values.
    HotParams,
    Regular,
}

impl TierReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierReason::HotRequest => "hot_request",
            TierReason::NegativeCache => "negative_cache",
            TierReason::HotParams => "hot_params",
            TierReason::Regular => "regular_cache",
        }
    }
}

/// Outcome of [`TierPolicy::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: CacheTier,
    pub ttl: Duration,
    pub reason: TierReason,
}

/// The part of an upstream response the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Length of the `data` result list, `None` if the body has no such list.
    pub result_count: Option<usize>,
}

impl ResponseShape {
    pub fn of(body: &Value) -> Self {
        Self {
            result_count: body.get("data").and_then(Value::as_array).map(Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result_count == Some(0)
    }
}

/// Thresholds and TTLs for tier selection.
///
/// Defaults: a request seen more than 5 times in its window goes to the
/// long-lived tier for 120s; an empty result is negatively cached for 60s;
/// a request whose tracked parameters average more than 10 hits goes to the
/// long-lived tier for 150s; anything else is cached short-lived for 60s.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TierPolicy {
    #[serde(default = "default_hot_request_threshold")]
    pub hot_request_threshold: i64,
    #[serde(default = "default_hot_request_ttl")]
    pub hot_request_ttl_secs: u64,
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,
    #[serde(default = "default_hot_params_threshold")]
    pub hot_params_threshold: f64,
    #[serde(default = "default_hot_params_ttl")]
    pub hot_params_ttl_secs: u64,
    #[serde(default = "default_regular_ttl")]
    pub regular_ttl_secs: u64,
}

fn default_hot_request_threshold() -> i64 {
    5
}

fn default_hot_request_ttl() -> u64 {
    120
}

fn default_negative_ttl() -> u64 {
    60
}

fn default_hot_params_threshold() -> f64 {
    10.0
}

fn default_hot_params_ttl() -> u64 {
    150
}

fn default_regular_ttl() -> u64 {
    60
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            hot_request_threshold: default_hot_request_threshold(),
            hot_request_ttl_secs: default_hot_request_ttl(),
            negative_ttl_secs: default_negative_ttl(),
            hot_params_threshold: default_hot_params_threshold(),
            hot_params_ttl_secs: default_hot_params_ttl(),
            regular_ttl_secs: default_regular_ttl(),
        }
    }
}

impl TierPolicy {
    /// Pick a tier and TTL.
    ///
    /// Checks run in order and the first match wins: request hotness, empty
    /// response (only when `shape` is given), mean parameter hotness, default.
    pub fn classify(
        &self,
        param_hotness: &BTreeMap<String, i64>,
        request_hotness: i64,
        shape: Option<&ResponseShape>,
    ) -> Classification {
        if request_hotness > self.hot_request_threshold {
            return self.pick(CacheTier::Long, self.hot_request_ttl_secs, TierReason::HotRequest);
        }

        if shape.is_some_and(ResponseShape::is_empty) {
            return self.pick(CacheTier::Short, self.negative_ttl_secs, TierReason::NegativeCache);
        }

        if mean(param_hotness) > self.hot_params_threshold {
            return self.pick(CacheTier::Long, self.hot_params_ttl_secs, TierReason::HotParams);
        }

        self.pick(CacheTier::Short, self.regular_ttl_secs, TierReason::Regular)
    }

    fn pick(&self, tier: CacheTier, ttl_secs: u64, reason: TierReason) -> Classification {
        Classification {
            tier,
            ttl: Duration::from_secs(ttl_secs),
            reason,
        }
    }
}

/// Mean counter value; 0 for a request with no tracked parameters.
fn mean(param_hotness: &BTreeMap<String, i64>) -> f64 {
    if param_hotness.is_empty() {
        return 0.0;
    }
    let total: i64 = param_hotness.values().sum();
    total as f64 / param_hotness.len() as f64
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(counts: &[(&str, i64)]) -> BTreeMap<String, i64> {
        counts.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn hot_request_wins_over_empty_response() {
        let policy = TierPolicy::default();
        let empty = ResponseShape::of(&json!({"data": []}));
        let c = policy.classify(&BTreeMap::new(), 6, Some(&empty));
        assert_eq!(c.tier, CacheTier::Long);
        assert_eq!(c.ttl, Duration::from_secs(120));
        assert_eq!(c.reason, TierReason::HotRequest);
    }

    #[test]
    fn threshold_is_exclusive() {
        let c = TierPolicy::default().classify(&BTreeMap::new(), 5, None);
        assert_eq!(c.reason, TierReason::Regular);
        assert_eq!(c.tier, CacheTier::Short);
    }

    #[test]
    fn empty_response_is_negatively_cached() {
        let empty = ResponseShape::of(&json!({"data": [], "pagination": {}}));
        let c = TierPolicy::default().classify(&params(&[("status:airing", 50)]), 1, Some(&empty));
        assert_eq!(c.tier, CacheTier::Short);
        assert_eq!(c.ttl, Duration::from_secs(60));
        assert_eq!(c.reason, TierReason::NegativeCache);
    }

    #[test]
    fn hot_params_promote() {
        let shape = ResponseShape::of(&json!({"data": [{"mal_id": 1}]}));
        let c = TierPolicy::default().classify(
            &params(&[("status:airing", 15), ("order_by:score", 8)]),
            1,
            Some(&shape),
        );
        assert_eq!(c.tier, CacheTier::Long);
        assert_eq!(c.ttl, Duration::from_secs(150));
        assert_eq!(c.reason, TierReason::HotParams);
    }

    #[test]
    fn mean_must_exceed_threshold() {
        let c = TierPolicy::default().classify(&params(&[("a:1", 10), ("b:2", 10)]), 1, None);
        assert_eq!(c.reason, TierReason::Regular);
    }

    #[test]
    fn no_tracked_params_does_not_divide_by_zero() {
        let c = TierPolicy::default().classify(&BTreeMap::new(), 1, None);
        assert_eq!(c.tier, CacheTier::Short);
        assert_eq!(c.ttl, Duration::from_secs(60));
    }

    #[test]
    fn body_without_data_is_not_negative() {
        let shape = ResponseShape::of(&json!({"pagination": {}}));
        assert_eq!(shape.result_count, None);
        let c = TierPolicy::default().classify(&BTreeMap::new(), 1, Some(&shape));
        assert_eq!(c.reason, TierReason::Regular);
    }

    #[test]
    fn classify_is_deterministic() {
        let policy = TierPolicy::default();
        let p = params(&[("genres:1", 12)]);
        assert_eq!(policy.classify(&p, 2, None), policy.classify(&p, 2, None));
    }
}
