//! Per-subject search parameters.
//!
//! Each subject has a closed set of fields. Both flatten into the same
//! [`SearchQuery`] shape so canonicalization, hotness tracking and caching
//! never need to know which subject they are dealing with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::filter::{AnimeStatus, AnimeType, MangaStatus, MangaType, OrderBy, Rating, SortOrder};
use super::request::Subject;
use super::validation;
use crate::Result;

/// Search parameters for `GET /anime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimeParams {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnimeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AnimeStatus>,
    pub sfw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Genre names, resolved to upstream ids before the request is sent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for AnimeParams {
    fn default() -> Self {
        Self {
            kind: None,
            order_by: None,
            sort: None,
            status: None,
            sfw: true,
            min_score: None,
            max_score: None,
            start_date: None,
            end_date: None,
            genres: Vec::new(),
            rating: None,
            q: None,
            page: None,
            limit: None,
        }
    }
}

impl AnimeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: AnimeType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn status(mut self, status: AnimeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sfw(mut self, sfw: bool) -> Self {
        self.sfw = sfw;
        self
    }

    pub fn score_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_score = min;
        self.max_score = max;
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    pub fn rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Check the few constraints the upstream would otherwise reject.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.order_by, Some(OrderBy::Chapters | OrderBy::Volumes)) {
            return Err(crate::GatewayError::Validation(format!(
                "order_by '{}' is not available for anime",
                self.order_by.map(|o| o.as_str()).unwrap_or_default()
            )));
        }
        validation::check_scores(self.min_score, self.max_score)?;
        validation::check_dates(self.start_date.as_deref(), self.end_date.as_deref())?;
        validation::check_paging(self.page, self.limit)
    }

    pub(crate) fn to_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(Subject::Anime);
        query.push("type", self.kind.map(|k| k.as_str()));
        query.push("rating", self.rating.map(|r| r.as_str()));
        query.push("status", self.status.map(|s| s.as_str()));
        query.push_common(
            self.order_by,
            self.sort,
            self.sfw,
            self.min_score,
            self.max_score,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            self.q.as_deref(),
            self.page,
            self.limit,
        );
        query.genres = self.genres.clone();
        query
    }
}

/// Search parameters for `GET /manga`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MangaParams {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MangaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MangaStatus>,
    pub sfw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for MangaParams {
    fn default() -> Self {
        Self {
            kind: None,
            order_by: None,
            sort: None,
            status: None,
            sfw: true,
            min_score: None,
            max_score: None,
            start_date: None,
            end_date: None,
            genres: Vec::new(),
            q: None,
            page: None,
            limit: None,
        }
    }
}

impl MangaParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: MangaType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn status(mut self, status: MangaStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sfw(mut self, sfw: bool) -> Self {
        self.sfw = sfw;
        self
    }

    pub fn score_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_score = min;
        self.max_score = max;
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.order_by == Some(OrderBy::Episodes) {
            return Err(crate::GatewayError::Validation(
                "order_by 'episodes' is not available for manga".to_string(),
            ));
        }
        validation::check_scores(self.min_score, self.max_score)?;
        validation::check_dates(self.start_date.as_deref(), self.end_date.as_deref())?;
        validation::check_paging(self.page, self.limit)
    }

    pub(crate) fn to_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(Subject::Manga);
        query.push("type", self.kind.map(|k| k.as_str()));
        query.push("status", self.status.map(|s| s.as_str()));
        query.push_common(
            self.order_by,
            self.sort,
            self.sfw,
            self.min_score,
            self.max_score,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            self.q.as_deref(),
            self.page,
            self.limit,
        );
        query.genres = self.genres.clone();
        query
    }
}

/// A subject-agnostic view of a request: set query parameters plus the
/// still-unresolved genre labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub subject: Subject,
    /// Set parameters only; unset fields never appear.
    pub params: BTreeMap<String, String>,
    pub genres: Vec<String>,
}

impl SearchQuery {
    fn new(subject: Subject) -> Self {
        Self {
            subject,
            params: BTreeMap::new(),
            genres: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.params.insert(name.to_string(), value.to_string());
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_common(
        &mut self,
        order_by: Option<OrderBy>,
        sort: Option<SortOrder>,
        sfw: bool,
        min_score: Option<f64>,
        max_score: Option<f64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        q: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) {
        self.push("order_by", order_by.map(|o| o.as_str()));
        self.push("sort", sort.map(|s| s.as_str()));
        self.push("sfw", Some(sfw));
        self.push("min_score", min_score);
        self.push("max_score", max_score);
        self.push("start_date", start_date);
        self.push("end_date", end_date);
        self.push("q", q);
        self.push("page", page);
        self.push("limit", limit);
    }
}
