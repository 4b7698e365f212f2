//! In-process [`KeyValueStore`] backed by moka.
//!
//! Suitable for a single gateway instance and for tests. Each entry carries
//! its own deadline; moka's [`Expiry`] hook evicts it once the deadline
//! passes, and every read re-checks the deadline so an entry is never served
//! late. Read-modify-write operations go through moka's per-key
//! `and_compute_with`, which makes them atomic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;

use crate::traits::KeyValueStore;
use crate::{GatewayError, Result};

/// Default maximum number of keys held.
const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone)]
enum Data {
    Bytes(Vec<u8>),
    Counter(i64),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Slot {
    data: Data,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(data: Data, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(&self, _key: &String, value: &Slot, created_at: Instant) -> Option<Duration> {
        value.remaining(created_at)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.remaining(updated_at)
    }
}

/// Thread-safe in-memory store with per-key TTL.
pub struct MemoryStore {
    entries: Cache<String, Slot>,
}

impl MemoryStore {
    /// Create an empty store with the default capacity (100,000 keys).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max)
                .expire_after(SlotExpiry)
                .build(),
        }
    }

    fn live(&self, key: &str) -> Option<Slot> {
        self.entries
            .get(key)
            .filter(|slot| slot.is_live(Instant::now()))
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str) -> GatewayError {
    GatewayError::Store(format!(
        "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
    ))
}

/// Treat an expired-but-not-yet-evicted entry as absent.
fn live_value(existing: Option<moka::Entry<String, Slot>>) -> Option<Slot> {
    let now = Instant::now();
    existing
        .map(|entry| entry.into_value())
        .filter(|slot| slot.is_live(now))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.live(key).map(|slot| slot.data) {
            None => Ok(None),
            Some(Data::Bytes(bytes)) => Ok(Some(bytes)),
            Some(Data::Counter(n)) => Ok(Some(n.to_string().into_bytes())),
            Some(Data::Hash(_)) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_owned(),
            Slot::new(Data::Bytes(value.to_vec()), Some(ttl)),
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool> {
        let result = self
            .entries
            .entry(key.to_owned())
            .and_compute_with(|existing| match live_value(existing) {
                Some(_) => Op::Nop,
                None => Op::Put(Slot::new(Data::Bytes(value.to_vec()), Some(ttl))),
            });
        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<i64> {
        let result = self
            .entries
            .entry(key.to_owned())
            .and_compute_with(|existing| match live_value(existing) {
                Some(Slot {
                    data: Data::Counter(n),
                    expires_at,
                }) => Op::Put(Slot {
                    data: Data::Counter(n + 1),
                    expires_at,
                }),
                Some(_) => Op::Nop,
                None => Op::Put(Slot::new(Data::Counter(1), Some(window))),
            });

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                match entry.into_value().data {
                    Data::Counter(n) => Ok(n),
                    _ => Err(wrong_type(key)),
                }
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let result = self
            .entries
            .entry(key.to_owned())
            .and_compute_with(|existing| match live_value(existing) {
                Some(slot) => Op::Put(Slot::new(slot.data, Some(ttl))),
                None => Op::Nop,
            });
        Ok(matches!(result, CompResult::ReplacedWith(_)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live(key).is_some())
    }

    async fn hash_set_if_absent(&self, table: &str, field: &str, value: &str) -> Result<bool> {
        let mut mismatched = false;
        let result = self
            .entries
            .entry(table.to_owned())
            .and_compute_with(|existing| match live_value(existing) {
                Some(Slot {
                    data: Data::Hash(mut map),
                    expires_at,
                }) => {
                    if map.contains_key(field) {
                        Op::Nop
                    } else {
                        map.insert(field.to_owned(), value.to_owned());
                        Op::Put(Slot {
                            data: Data::Hash(map),
                            expires_at,
                        })
                    }
                }
                Some(_) => {
                    mismatched = true;
                    Op::Nop
                }
                None => {
                    let map = HashMap::from([(field.to_owned(), value.to_owned())]);
                    Op::Put(Slot::new(Data::Hash(map), None))
                }
            });

        if mismatched {
            return Err(wrong_type(table));
        }
        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn hash_get(&self, table: &str, field: &str) -> Result<Option<String>> {
        match self.live(table).map(|slot| slot.data) {
            None => Ok(None),
            Some(Data::Hash(map)) => Ok(map.get(field).cloned()),
            Some(_) => Err(wrong_type(table)),
        }
    }
}
