//! Canonical request keys.
//!
//! A [`CanonicalKey`] is the identity of a parameter set: the same key is used
//! as the cache-key suffix and as the collapsing identity. It is a readable
//! query string (`order_by=score&status=airing`) so it can be inspected in the
//! store while debugging.

use std::fmt;

use url::form_urlencoded;

/// Deterministic, order-independent identity of a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a parameter mapping.
///
/// Pairs are sorted by name (then value), rendered as `name=value` and joined
/// with `&`. Values are form-urlencoded so delimiters inside values cannot
/// produce collisions. Callers drop unset parameters beforehand.
///
/// ```rust
/// # use recogate::cache::canonicalize;
/// let key = canonicalize([("status", "airing"), ("order_by", "score")]);
/// assert_eq!(key.as_str(), "order_by=score&status=airing");
/// ```
pub fn canonicalize<I, K, V>(params: I) -> CanonicalKey
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|(ka, va), (kb, vb)| {
        (ka.as_ref(), va.as_ref()).cmp(&(kb.as_ref(), vb.as_ref()))
    });

    let rendered: Vec<String> = pairs
        .iter()
        .map(|(name, value)| {
            let encoded: String = form_urlencoded::byte_serialize(value.as_ref().as_bytes()).collect();
            format!("{}={}", name.as_ref(), encoded)
        })
        .collect();

    CanonicalKey(rendered.join("&"))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;

    #[test]
    fn order_independent() {
        let a = canonicalize([("status", "airing"), ("order_by", "score")]);
        let b = canonicalize([("order_by", "score"), ("status", "airing")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "order_by=score&status=airing");
    }

    #[test]
    fn hash_map_iteration_order_does_not_leak() {
        let mut hashed = HashMap::new();
        let mut sorted = BTreeMap::new();
        for (k, v) in [("type", "tv"), ("genres", "1,4"), ("sfw", "true"), ("rating", "pg13")] {
            hashed.insert(k, v);
            sorted.insert(k, v);
        }
        assert_eq!(canonicalize(hashed), canonicalize(sorted));
    }

    #[test]
    fn values_are_encoded() {
        let key = canonicalize([("genres", "1,4"), ("q", "one piece&x=1")]);
        assert_eq!(key.as_str(), "genres=1%2C4&q=one+piece%26x%3D1");
    }

    #[test]
    fn distinct_sets_differ() {
        let a = canonicalize([("q", "a&b=c")]);
        let b = canonicalize([("q", "a"), ("b", "c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_mapping() {
        let key = canonicalize(Vec::<(String, String)>::new());
        assert_eq!(key.as_str(), "");
    }
}
