//! HTTP client for the hosted vector index (Pinecone-style REST API).
//!
//! The index stores one vector per property plus a small metadata snapshot
//! used for pre-filtering. Canonical listing data never lives here; matches
//! are joined back against the record store by id.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::config::VectorIndexConfig;
use crate::models::PropertyRecord;

/// Metadata stored alongside each vector. Enough for index-side filtering
/// and for debugging a match without a record-store round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub property_type: String,
    pub city: String,
    pub state: String,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub title: String,
}

impl From<&PropertyRecord> for IndexMetadata {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            property_type: record.property_type.as_str().to_string(),
            city: record.city.clone(),
            state: record.state.clone(),
            price: record.price,
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            title: record.title.clone(),
        }
    }
}

/// One vector ready for upsert. Upserts are idempotent: re-sending the same
/// id overwrites the stored vector and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: IndexMetadata,
}

/// A scored match from a query, similarity score in [0, 1].
#[derive(Debug, Clone, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<IndexMetadata>,
}

/// Index-wide statistics, resolved to the configured namespace when one is
/// set.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: Option<u32>,
}

pub struct VectorIndex {
    client: reqwest::Client,
    config: VectorIndexConfig,
}

impl VectorIndex {
    pub fn new(client: reqwest::Client, config: VectorIndexConfig) -> Self {
        Self { client, config }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.config.base_url);
        let mut req = self.client.post(&url);
        if let Some(key) = &self.config.api_key {
            req = req.header("Api-Key", key);
        }
        req
    }

    /// Upsert a batch of vectors in a single request. Returns the count the
    /// index acknowledged.
    pub async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let req = UpsertRequest {
            vectors: records.to_vec(),
            namespace: self.config.namespace.clone(),
        };

        let resp = self
            .post("/vectors/upsert")
            .json(&req)
            .send()
            .await
            .context("Failed to call vector index upsert")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vector index upsert returned {status}: {body}");
        }

        let body: UpsertResponse = resp
            .json()
            .await
            .context("Failed to parse vector index upsert response")?;

        Ok(body.upserted_count.unwrap_or(records.len()))
    }

    /// Nearest-neighbor query with an optional metadata filter. `top_k`
    /// already includes any overfetch factor applied by the caller.
    pub async fn query(
        &self,
        vector: &[f32],
        filter: Option<Value>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let req = QueryRequest {
            vector: vector.to_vec(),
            top_k,
            include_metadata: true,
            filter,
            namespace: self.config.namespace.clone(),
        };

        let resp = self
            .post("/query")
            .json(&req)
            .send()
            .await
            .context("Failed to call vector index query")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vector index query returned {status}: {body}");
        }

        let body: QueryResponse = resp
            .json()
            .await
            .context("Failed to parse vector index query response")?;

        Ok(body.matches)
    }

    /// Delete vectors by id, for listings removed from the record store.
    pub async fn delete(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let req = DeleteRequest {
            ids: ids.to_vec(),
            namespace: self.config.namespace.clone(),
        };

        let resp = self
            .post("/vectors/delete")
            .json(&req)
            .send()
            .await
            .context("Failed to call vector index delete")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vector index delete returned {status}: {body}");
        }

        Ok(())
    }

    /// Fetch index statistics. When a namespace is configured the vector
    /// count is that namespace's count, not the index-wide total.
    pub async fn stats(&self) -> Result<IndexStats> {
        let resp = self
            .post("/describe_index_stats")
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Failed to call vector index stats")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vector index stats returned {status}: {body}");
        }

        let body: StatsResponse = resp
            .json()
            .await
            .context("Failed to parse vector index stats response")?;

        let total_vector_count = match &self.config.namespace {
            Some(ns) => body
                .namespaces
                .get(ns)
                .map(|n| n.vector_count)
                .unwrap_or(0),
            None => body.total_vector_count,
        };

        Ok(IndexStats {
            total_vector_count,
            dimension: body.dimension,
        })
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<VectorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
    #[serde(default)]
    dimension: Option<u32>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use chrono::Utc;

    fn record() -> PropertyRecord {
        PropertyRecord {
            id: "prop-1".to_string(),
            title: "Casa Sol".to_string(),
            description: "Hermosa casa".to_string(),
            property_type: PropertyType::House,
            city: "Cancún".to_string(),
            state: "Quintana Roo".to_string(),
            neighborhood: None,
            price: 2_500_000.0,
            bedrooms: 3,
            bathrooms: 2,
            area_m2: Some(180.0),
            amenities: vec!["alberca".to_string()],
            features: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_metadata_snapshot_from_record() {
        let meta = IndexMetadata::from(&record());
        assert_eq!(meta.property_type, "house");
        assert_eq!(meta.city, "Cancún");
        assert_eq!(meta.price, 2_500_000.0);
        assert_eq!(meta.bedrooms, 3);
        assert_eq!(meta.title, "Casa Sol");
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let meta = IndexMetadata::from(&record());
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("propertyType").is_some());
        assert!(json.get("property_type").is_none());
    }

    #[test]
    fn test_query_request_omits_absent_filter_and_namespace() {
        let req = QueryRequest {
            vector: vec![0.1, 0.2],
            top_k: 20,
            include_metadata: true,
            filter: None,
            namespace: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["topK"], 20);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("filter").is_none());
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_stats_response_parses_pinecone_shape() {
        let raw = r#"{
            "namespaces": {"prod": {"vectorCount": 120}},
            "dimension": 768,
            "indexFullness": 0.0,
            "totalVectorCount": 150
        }"#;
        let parsed: StatsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.total_vector_count, 150);
        assert_eq!(parsed.dimension, Some(768));
        assert_eq!(parsed.namespaces["prod"].vector_count, 120);
    }

    #[test]
    fn test_match_parses_without_metadata() {
        let raw = r#"{"id": "prop-9", "score": 0.83}"#;
        let parsed: VectorMatch = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.id, "prop-9");
        assert!(parsed.metadata.is_none());
    }
}
