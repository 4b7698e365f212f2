//! Public types for the Recogate API.

mod filter;
mod params;
mod request;
mod validation;

pub use filter::{AnimeStatus, AnimeType, MangaStatus, MangaType, OrderBy, Rating, SortOrder};
pub use params::{AnimeParams, MangaParams, SearchQuery};
pub use request::{RecommendationRequest, Subject};
pub use validation::MAX_LIMIT;
