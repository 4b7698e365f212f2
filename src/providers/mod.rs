//! Upstream API clients.
//!
//! The gateway core only depends on [`UpstreamFetcher`](crate::traits::UpstreamFetcher);
//! this module holds the concrete HTTP implementation.

pub mod jikan;

pub use jikan::JikanClient;
