//! Inbound recommendation requests.

use serde::{Deserialize, Serialize};

use super::params::{AnimeParams, MangaParams, SearchQuery};
use crate::Result;

/// Subject domain of a request. Selects the upstream endpoint and lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Anime,
    Manga,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Anime => "anime",
            Subject::Manga => "manga",
        }
    }

    /// Upstream search path, relative to the API base URL.
    pub fn search_path(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated-shape request, tagged by subject.
///
/// ```rust
/// # use recogate::RecommendationRequest;
/// let request: RecommendationRequest = serde_json::from_str(
///     r#"{"subject": "anime", "status": "airing", "genres": ["Action"]}"#,
/// ).unwrap();
/// assert_eq!(request.subject().as_str(), "anime");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "lowercase")]
pub enum RecommendationRequest {
    Anime(AnimeParams),
    Manga(MangaParams),
}

impl RecommendationRequest {
    pub fn subject(&self) -> Subject {
        match self {
            RecommendationRequest::Anime(_) => Subject::Anime,
            RecommendationRequest::Manga(_) => Subject::Manga,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RecommendationRequest::Anime(params) => params.validate(),
            RecommendationRequest::Manga(params) => params.validate(),
        }
    }

    /// Flatten into the subject-agnostic query shape.
    pub fn to_query(&self) -> SearchQuery {
        match self {
            RecommendationRequest::Anime(params) => params.to_query(),
            RecommendationRequest::Manga(params) => params.to_query(),
        }
    }
}

impl From<AnimeParams> for RecommendationRequest {
    fn from(params: AnimeParams) -> Self {
        RecommendationRequest::Anime(params)
    }
}

impl From<MangaParams> for RecommendationRequest {
    fn from(params: MangaParams) -> Self {
        RecommendationRequest::Manga(params)
    }
}
