//! Category label → upstream id resolution.
//!
//! The upstream filters genres by numeric id, while callers send names.
//! [`LookupResolver`] keeps one hash table per [`LookupDomain`] in the shared
//! store, filled lazily from the upstream's full enumeration and kept for a
//! long TTL independent of request traffic. Population is collapsed per
//! table, so a burst of cold requests triggers one enumeration fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::collapse::RequestCollapser;
use crate::telemetry;
use crate::traits::{KeyValueStore, UpstreamFetcher};
use crate::types::Subject;
use crate::{GatewayError, Result};

/// Default lifetime of a populated lookup table.
pub const DEFAULT_LOOKUP_TTL: Duration = Duration::from_secs(10_000);

/// A family of labels for one subject, e.g. anime genres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupDomain {
    pub kind: &'static str,
    pub subject: Subject,
}

impl LookupDomain {
    /// Genres, explicit genres, themes and demographics of a subject.
    pub fn genres(subject: Subject) -> Self {
        Self {
            kind: "genres",
            subject,
        }
    }

    /// Store key of the table, e.g. `lookup:genres:anime`.
    pub fn table(&self) -> String {
        format!("lookup:{}:{}", self.kind, self.subject)
    }

    /// Upstream path of the full enumeration, e.g. `genres/anime`.
    pub fn enumeration_path(&self) -> String {
        format!("{}/{}", self.kind, self.subject)
    }
}

/// One entry of an upstream enumeration.
#[derive(Debug, Deserialize)]
struct LookupEntry {
    mal_id: i64,
    name: String,
}

/// Resolves free-text labels through lazily populated lookup tables.
pub struct LookupResolver {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn UpstreamFetcher>,
    ttl: Duration,
    populations: RequestCollapser<usize>,
}

impl LookupResolver {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn UpstreamFetcher>, ttl: Duration) -> Self {
        Self {
            store,
            fetcher,
            ttl,
            populations: RequestCollapser::new(),
        }
    }

    /// Resolve `labels` (case-insensitive) to upstream ids, in input order.
    ///
    /// Fails with [`GatewayError::Resolution`] naming every label that has no
    /// entry, rather than silently dropping it.
    pub async fn resolve(&self, labels: &[String], domain: LookupDomain) -> Result<Vec<i64>> {
        let table = domain.table();
        if !self.store.exists(&table).await? {
            self.populations
                .run(&table, || self.populate(&table, domain))
                .await?;
        }

        let mut ids = Vec::with_capacity(labels.len());
        let mut unresolved = Vec::new();
        for label in labels {
            let id = self
                .store
                .hash_get(&table, &label.to_lowercase())
                .await?
                .and_then(|raw| raw.parse::<i64>().ok());
            match id {
                Some(id) => ids.push(id),
                None => unresolved.push(label.clone()),
            }
        }

        if !unresolved.is_empty() {
            return Err(GatewayError::Resolution {
                domain: table,
                labels: unresolved,
            });
        }
        debug!(%table, ?ids, "labels resolved");
        Ok(ids)
    }

    /// Fetch the full enumeration and write it into the table.
    ///
    /// Fields are insert-if-absent, so a racing populator on another
    /// instance cannot overwrite an existing mapping. The TTL is reset after
    /// every insert: a population that fails partway still leaves a table
    /// that expires and is fetched again.
    async fn populate(&self, table: &str, domain: LookupDomain) -> Result<usize> {
        info!(table, "lookup table missing, fetching enumeration");
        let start = Instant::now();

        let body = self.fetcher.fetch(&domain.enumeration_path(), &[]).await?;
        let entries = parse_entries(body)?;

        let mut inserted = 0;
        for entry in &entries {
            if self
                .store
                .hash_set_if_absent(table, &entry.name.to_lowercase(), &entry.mal_id.to_string())
                .await?
            {
                inserted += 1;
            }
            self.store.expire(table, self.ttl).await?;
        }

        metrics::counter!(telemetry::LOOKUP_POPULATIONS_TOTAL, "domain" => table.to_owned())
            .increment(1);
        info!(
            table,
            entries = entries.len(),
            inserted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lookup table populated"
        );
        Ok(inserted)
    }
}

fn parse_entries(body: Value) -> Result<Vec<LookupEntry>> {
    let data = match body {
        Value::Object(mut map) => map.remove("data"),
        _ => None,
    }
    .ok_or_else(|| GatewayError::Json("enumeration response has no 'data' list".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn table_and_path_per_subject() {
        let anime = LookupDomain::genres(Subject::Anime);
        let manga = LookupDomain::genres(Subject::Manga);
        assert_eq!(anime.table(), "lookup:genres:anime");
        assert_eq!(anime.enumeration_path(), "genres/anime");
        assert_eq!(manga.table(), "lookup:genres:manga");
        assert_eq!(manga.enumeration_path(), "genres/manga");
    }

    #[test]
    fn parse_enumeration() {
        let body = json!({"data": [
            {"mal_id": 1, "name": "Action", "url": "https://example", "count": 5000},
            {"mal_id": 4, "name": "Comedy", "url": "https://example", "count": 7000},
        ]});
        let entries = parse_entries(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].mal_id, 4);
        assert_eq!(entries[1].name, "Comedy");
    }

    #[test]
    fn enumeration_without_data_is_an_error() {
        assert!(matches!(
            parse_entries(json!({"status": 200})),
            Err(GatewayError::Json(_))
        ));
    }
}
