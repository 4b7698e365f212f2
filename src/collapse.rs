//! Request collapsing (singleflight).
//!
//! [`RequestCollapser::run`] guarantees at most one execution of `work` per
//! key at a time within a process. The first caller for a key (the creator)
//! runs `work` itself; callers arriving while it is in flight (joiners) wait
//! on a [`watch`] channel and receive a clone of the creator's outcome,
//! success or error alike.
//!
//! The pending map is guarded by a plain mutex that is only held while the
//! map is mutated, never across an await, so fetches for unrelated keys run
//! concurrently. The creator removes its key after publishing, so the next
//! call after completion starts a fresh fetch instead of reusing a stale
//! result. A creator that is dropped mid-fetch never strands its joiners:
//! one of them becomes the creator and the rest follow it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::telemetry;
use crate::Result;

type Outcome<T> = Option<Result<T>>;

enum Role<T> {
    Creator(watch::Sender<Outcome<T>>),
    Joiner(watch::Receiver<Outcome<T>>),
}

/// Deduplicates concurrent work by key.
pub struct RequestCollapser<T> {
    pending: Mutex<HashMap<String, watch::Receiver<Outcome<T>>>>,
}

impl<T: Clone> RequestCollapser<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, or join the run already in flight.
    ///
    /// All callers sharing one run observe the same value or the same error.
    /// If the creator is dropped before `work` finishes, its key is still
    /// released and the first surviving joiner takes over: it registers
    /// itself as the new creator and runs its own `work`, which the remaining
    /// joiners then share.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            let role = {
                let mut pending = self.lock();
                match pending.get(key) {
                    Some(rx) => Role::Joiner(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        pending.insert(key.to_owned(), rx);
                        Role::Creator(tx)
                    }
                }
            };

            match role {
                Role::Creator(tx) => {
                    debug!(key, "collapser: starting fetch");
                    let _release = Release {
                        collapser: self,
                        key,
                    };
                    let outcome = work().await;
                    tx.send_replace(Some(outcome.clone()));
                    return outcome;
                }
                Role::Joiner(mut rx) => {
                    debug!(key, "collapser: joining in-flight fetch");
                    metrics::counter!(telemetry::COLLAPSED_TOTAL).increment(1);
                    // A closed channel means the creator went away unpublished.
                    if let Ok(published) = rx.wait_for(Option::is_some).await
                        && let Some(outcome) = &*published
                    {
                        return outcome.clone();
                    }
                    debug!(key, "collapser: creator dropped, taking over");
                }
            }
        }
    }

    /// Number of keys with a fetch in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<Outcome<T>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for RequestCollapser<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the creator's key on drop: after publication on the normal path,
/// or when the creator future is cancelled mid-fetch.
struct Release<'a, T: Clone> {
    collapser: &'a RequestCollapser<T>,
    key: &'a str,
}

impl<T: Clone> Drop for Release<'_, T> {
    fn drop(&mut self) {
        self.collapser.lock().remove(self.key);
    }
}
