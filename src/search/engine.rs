//! The search pipeline, end to end.
//!
//! One engine instance is shared by the whole process. It owns the HTTP
//! clients, the compiled filter extractor, and the readiness cell; all other
//! modules are stateless adapters it drives.

use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::extract::FilterExtractor;
use crate::llm::{analysis, embeddings};
use crate::models::{
    PropertyFilter, PropertyRecord, RankedProperty, SearchRequest, SearchResponse,
};
use crate::records;
use crate::search::merge::merge_results;
use crate::vector::{self, VectorIndex, VectorMatch};

/// Lifecycle of the engine. Search is only served in `Ready`; everything
/// else maps to a `NotReady` error so callers can distinguish "starting up"
/// from "broken".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Uninitialized => write!(f, "not initialized"),
            Readiness::Loading => write!(f, "initialization in progress"),
            Readiness::Ready => write!(f, "ready"),
            Readiness::Failed(msg) => write!(f, "initialization failed: {msg}"),
        }
    }
}

pub struct SearchEngine {
    config: Config,
    /// Shared client for the LLM and record-store adapters.
    http: reqwest::Client,
    extractor: FilterExtractor,
    index: VectorIndex,
    readiness: RwLock<Readiness>,
}

impl SearchEngine {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        // The index gets its own client so its tighter per-request timeout
        // never throttles the slower LLM calls.
        let index_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.vector_index.timeout_secs))
            .build()?;
        let index = VectorIndex::new(index_client, config.vector_index.clone());

        Ok(Self {
            config,
            http,
            extractor: FilterExtractor::new(),
            index,
            readiness: RwLock::new(Readiness::Uninitialized),
        })
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.read().clone()
    }

    /// Probe the vector index and transition to `Ready` or `Failed`.
    /// May be called again after a failure to retry.
    pub async fn initialize(&self) -> Result<()> {
        *self.readiness.write() = Readiness::Loading;
        tracing::info!(
            "Initializing search engine against index at {}",
            self.config.vector_index.base_url
        );

        match self.index.stats().await {
            Ok(stats) => {
                if let Some(dim) = stats.dimension {
                    if dim as usize != self.config.llm.embedding_dim {
                        tracing::warn!(
                            "Index dimension {dim} differs from configured embedding dimension {}",
                            self.config.llm.embedding_dim
                        );
                    }
                }
                tracing::info!(
                    "Search engine ready: {} vectors indexed",
                    stats.total_vector_count
                );
                *self.readiness.write() = Readiness::Ready;
                Ok(())
            }
            Err(e) => {
                let err = SearchError::service("vector index", e);
                *self.readiness.write() = Readiness::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Full search pipeline: validate, extract filters, embed, query the
    /// index, hydrate records, rank, and (optionally) analyze.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        // ── Step 1: Validate before any remote call ──────────────
        let query = request.query.trim().to_string();
        if query.is_empty() {
            return Err(SearchError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        {
            let readiness = self.readiness.read();
            if *readiness != Readiness::Ready {
                return Err(SearchError::NotReady(readiness.to_string()));
            }
        }

        // max(1) keeps the clamp bounds ordered for a hand-built config
        let limit = request
            .limit
            .unwrap_or(self.config.search.default_limit)
            .clamp(1, self.config.search.max_limit.max(1));

        // ── Step 2: Structured filters (extracted + explicit) ────
        let extracted = self.extractor.extract(&query);
        let filters = PropertyFilter::merge(extracted, request.filters.clone());
        tracing::debug!("Effective filter: {filters:?}");

        // ── Step 3: Remote chain under one deadline ──────────────
        let deadline = Duration::from_secs(self.config.search.request_timeout_secs);
        let top_k = limit * self.config.search.overfetch_factor;
        let index_filter = vector::to_index_filter(&filters);

        let (matches, record_rows) =
            tokio::time::timeout(deadline, self.run_remote(&query, index_filter, top_k))
                .await
                .map_err(|_| SearchError::Timeout(deadline))??;

        // ── Step 4: Short-circuit on zero matches ────────────────
        if matches.is_empty() {
            tracing::info!("No index matches for '{query}'");
            return Ok(self.empty_response(query, filters));
        }

        // ── Step 5: Merge, rank, truncate ────────────────────────
        let mut results = merge_results(&matches, record_rows);
        if results.is_empty() {
            // Every match pointed at a deleted listing
            tracing::warn!(
                "All {} matches were dangling ids; index is stale",
                matches.len()
            );
            return Ok(self.empty_response(query, filters));
        }
        let total_matches = results.len();
        results.truncate(limit);

        // ── Step 6: Analysis (never sinks the response) ──────────
        let analysis = if !request.include_analysis {
            None
        } else if !self.config.search.analysis_enabled {
            Some(analysis::fallback_summary(&results))
        } else {
            Some(self.analyze(&query, &results).await)
        };

        let total = results.len();
        Ok(SearchResponse {
            success: true,
            query,
            filters,
            properties: results,
            total,
            total_matches,
            analysis,
            message: result_message(total),
            suggestions: None,
        })
    }

    /// The remote leg of the pipeline: embed, query, hydrate. Runs inside
    /// the caller's deadline; each boundary failure is tagged with the
    /// service that caused it.
    async fn run_remote(
        &self,
        query: &str,
        index_filter: Option<Value>,
        top_k: usize,
    ) -> Result<(Vec<VectorMatch>, Vec<PropertyRecord>)> {
        let embedding = embeddings::embed_single(&self.http, &self.config.llm, query)
            .await
            .map_err(|e| SearchError::service("embedding", e))?;

        let mut matches = self
            .index
            .query(&embedding, index_filter, top_k)
            .await
            .map_err(|e| SearchError::service("vector index", e))?;

        let raw = matches.len();
        matches.retain(|m| m.score >= self.config.search.min_score);
        if matches.len() < raw {
            tracing::debug!(
                "Dropped {} matches below min score {}",
                raw - matches.len(),
                self.config.search.min_score
            );
        }

        if matches.is_empty() {
            // Nothing to hydrate; skip the record store entirely
            return Ok((matches, Vec::new()));
        }

        let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
        let record_rows = records::fetch_by_ids(&self.http, &self.config.record_store, &ids)
            .await
            .map_err(|e| SearchError::service("record store", e))?;

        Ok((matches, record_rows))
    }

    async fn analyze(&self, query: &str, results: &[RankedProperty]) -> String {
        match analysis::generate(&self.http, &self.config.llm, query, results).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Analysis generation failed, using fallback: {e:#}");
                analysis::fallback_summary(results)
            }
        }
    }

    fn empty_response(&self, query: String, filters: PropertyFilter) -> SearchResponse {
        let suggestions = suggest(&filters);
        SearchResponse {
            success: true,
            query,
            filters,
            properties: Vec::new(),
            total: 0,
            total_matches: 0,
            analysis: None,
            message: "No se encontraron propiedades que coincidan con tu búsqueda.".to_string(),
            suggestions: Some(suggestions),
        }
    }
}

fn result_message(total: usize) -> String {
    if total == 1 {
        "Se encontró 1 propiedad.".to_string()
    } else {
        format!("Se encontraron {total} propiedades.")
    }
}

/// Refinement tips for an empty result set, derived from which filter
/// dimensions the query did and did not constrain. Always non-empty.
fn suggest(filters: &PropertyFilter) -> Vec<String> {
    let mut tips = Vec::new();

    if filters.city.is_none() && !filters.cdmx {
        tips.push("Agrega una ciudad, por ejemplo \"en Cancún\" o \"en Mérida\".".to_string());
    }
    if filters.property_type.is_none() {
        tips.push(
            "Indica el tipo de propiedad, por ejemplo \"casa\" o \"departamento\".".to_string(),
        );
    }
    if filters.bedrooms.is_none() {
        tips.push("Especifica cuántas recámaras necesitas.".to_string());
    }
    if filters.min_price.is_some() || filters.max_price.is_some() {
        tips.push("Amplía tu rango de precio.".to_string());
    }

    if tips.is_empty() {
        tips.push("Intenta con términos más generales o revisa la ortografía.".to_string());
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    #[test]
    fn test_readiness_messages() {
        assert_eq!(Readiness::Uninitialized.to_string(), "not initialized");
        assert_eq!(Readiness::Loading.to_string(), "initialization in progress");
        assert_eq!(
            Readiness::Failed("boom".to_string()).to_string(),
            "initialization failed: boom"
        );
    }

    #[test]
    fn test_suggest_names_missing_dimensions() {
        let filters = PropertyFilter {
            max_price: Some(3_000_000.0),
            ..Default::default()
        };
        let tips = suggest(&filters);
        assert!(tips.iter().any(|t| t.contains("ciudad")));
        assert!(tips.iter().any(|t| t.contains("tipo de propiedad")));
        assert!(tips.iter().any(|t| t.contains("rango de precio")));
    }

    #[test]
    fn test_suggest_skips_present_dimensions() {
        let filters = PropertyFilter {
            city: Some("Cancún".to_string()),
            property_type: Some(PropertyType::House),
            ..Default::default()
        };
        let tips = suggest(&filters);
        assert!(!tips.iter().any(|t| t.contains("Agrega una ciudad")));
        assert!(!tips.iter().any(|t| t.contains("tipo de propiedad")));
        assert!(tips.iter().any(|t| t.contains("recámaras")));
    }

    #[test]
    fn test_suggest_cdmx_counts_as_city() {
        let filters = PropertyFilter {
            cdmx: true,
            ..Default::default()
        };
        let tips = suggest(&filters);
        assert!(!tips.iter().any(|t| t.contains("Agrega una ciudad")));
    }

    #[test]
    fn test_suggest_never_empty() {
        let fully_constrained = PropertyFilter {
            city: Some("Cancún".to_string()),
            property_type: Some(PropertyType::House),
            bedrooms: Some(3),
            ..Default::default()
        };
        assert!(!suggest(&fully_constrained).is_empty());
        assert!(!suggest(&PropertyFilter::default()).is_empty());
    }

    #[test]
    fn test_result_message_pluralizes() {
        assert_eq!(result_message(1), "Se encontró 1 propiedad.");
        assert_eq!(result_message(7), "Se encontraron 7 propiedades.");
    }
}
