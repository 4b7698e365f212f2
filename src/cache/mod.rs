//! Caching subsystem.
//!
//! - [`canonical`]: order-independent request identities.
//! - [`hotness`]: shared decaying-window counters used as promotion signals.
//! - [`tier`]: the pure tier/TTL classifier.
//!
//! Cache entries themselves live in the shared
//! [`KeyValueStore`](crate::traits::KeyValueStore) under
//! `{tier}:{identity}`, where `identity` is `{subject}?{canonical key}`.

pub mod canonical;
pub mod hotness;
pub mod tier;

pub use canonical::{CanonicalKey, canonicalize};
pub use hotness::{HotnessSnapshot, HotnessTracker, TRACKED_PARAMS};
pub use tier::{Classification, ResponseShape, TierPolicy, TierReason};

use crate::types::Subject;

/// A named cache bucket with its own retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Longer-lived entries (hot requests, hot parameters).
    Long,
    /// Shorter-lived entries (regular and negative caching).
    Short,
}

impl CacheTier {
    /// Order in which tiers are probed: longest-lived first.
    pub const PROBE_ORDER: [CacheTier; 2] = [CacheTier::Long, CacheTier::Short];

    /// Key prefix in the store.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheTier::Long => "l1",
            CacheTier::Short => "l2",
        }
    }

    /// Store key of the entry for `identity` in this tier.
    pub fn key(&self, identity: &str) -> String {
        format!("{}:{identity}", self.prefix())
    }
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Full request identity: the subject's search path plus the canonical key.
pub fn request_identity(subject: Subject, key: &CanonicalKey) -> String {
    format!("{}?{}", subject.search_path(), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_keys() {
        let key = canonicalize([("status", "airing")]);
        let identity = request_identity(Subject::Anime, &key);
        assert_eq!(identity, "anime?status=airing");
        assert_eq!(CacheTier::Long.key(&identity), "l1:anime?status=airing");
        assert_eq!(CacheTier::Short.key(&identity), "l2:anime?status=airing");
    }

    #[test]
    fn probe_order_is_longest_first() {
        assert_eq!(CacheTier::PROBE_ORDER, [CacheTier::Long, CacheTier::Short]);
    }
}
