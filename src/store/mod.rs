//! [`KeyValueStore`](crate::traits::KeyValueStore) implementations.
//!
//! - [`MemoryStore`]: moka-backed, process-local. The default when no
//!   redis URL is configured, and what the test suite runs against.
//! - [`RedisStore`]: shared across gateway instances (feature `redis`).
//!   Required for hotness counters to reflect traffic on every instance.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
