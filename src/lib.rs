//! Recogate - caching recommendation gateway for the Jikan API
//!
//! This crate sits between recommendation clients and the rate-limited
//! Jikan (MyAnimeList) search API. Requests are canonicalized so that
//! equivalent parameter sets share one cache entry, genre names are resolved
//! to upstream ids through lazily populated lookup tables, and responses are
//! kept in a longer- or shorter-lived tier depending on how hot the request
//! and its parameters are. Concurrent identical misses share one upstream
//! fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use recogate::{AnimeParams, AnimeStatus, OrderBy, Recogate, RecommendationRequest};
//!
//! #[tokio::main]
//! async fn main() -> recogate::Result<()> {
//!     let gateway = Recogate::builder()
//!         .redis_url("redis://127.0.0.1:6379")
//!         .connect()
//!         .await?;
//!
//!     let request: RecommendationRequest = AnimeParams::new()
//!         .status(AnimeStatus::Airing)
//!         .order_by(OrderBy::Score)
//!         .genre("Action")
//!         .into();
//!
//!     let body = gateway.handle(&request).await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collapse;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lookup;
pub mod providers;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, Recogate, RecogateBuilder};
pub use traits::{KeyValueStore, UpstreamFetcher};

// Re-export all types
pub use types::{
    AnimeParams, AnimeStatus, AnimeType, MangaParams, MangaStatus, MangaType, OrderBy, Rating,
    RecommendationRequest, SearchQuery, SortOrder, Subject,
};
