//! Telemetry metric name constants.
//!
//! Centralised metric names for recogate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `recogate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `tier`: cache tier prefix ("l1" | "l2")
//! - `status`: upstream outcome: HTTP status code, or "error" for transport failures
//! - `domain`: lookup table name (e.g. "lookup:genres:anime")

/// Total cache hits.
///
/// Labels: `tier`.
pub const CACHE_HITS_TOTAL: &str = "recogate_cache_hits_total";

/// Total requests that missed every cache tier.
pub const CACHE_MISSES_TOTAL: &str = "recogate_cache_misses_total";

/// Total upstream requests sent.
///
/// Labels: `status`.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "recogate_upstream_requests_total";

/// Upstream request duration in seconds.
pub const UPSTREAM_DURATION_SECONDS: &str = "recogate_upstream_duration_seconds";

/// Total callers that joined an in-flight fetch instead of starting one.
pub const COLLAPSED_TOTAL: &str = "recogate_collapsed_total";

/// Total lookup table (re)builds from an upstream enumeration.
///
/// Labels: `domain`.
pub const LOOKUP_POPULATIONS_TOTAL: &str = "recogate_lookup_populations_total";

/// Total cache writes that failed and were swallowed.
pub const STORE_WRITE_FAILURES_TOTAL: &str = "recogate_store_write_failures_total";
