//! Offline indexing job: stream every record from the store, embed its
//! synthesized description, and upsert the vectors in batches.
//!
//! The job is resumable. Progress is never written anywhere; the vector
//! count already in the index tells us how far a previous run got, rounded
//! down to a page boundary because the count can lag recent upserts and the
//! last page may have been cut short. Re-processing a page is harmless
//! since upserts by id are idempotent.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::describe;
use crate::llm::embeddings;
use crate::records;
use crate::vector::{IndexMetadata, VectorIndex, VectorRecord};

/// Outcome of one indexing run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Records fetched from the store this run.
    pub scanned: usize,
    /// Vectors the index acknowledged.
    pub indexed: usize,
    /// Pages processed.
    pub pages: usize,
    /// Offset this run started at (0 for a fresh run).
    pub resumed_from: u64,
    pub elapsed_ms: u128,
}

pub struct IndexingJob {
    config: Config,
    http: reqwest::Client,
    index: VectorIndex,
}

impl IndexingJob {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let index_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.vector_index.timeout_secs))
            .build()?;
        let index = VectorIndex::new(index_client, config.vector_index.clone());

        Ok(Self {
            config,
            http,
            index,
        })
    }

    /// Run the job to completion. With `resume` the starting offset is
    /// derived from the index's current vector count; without it the whole
    /// catalog is re-indexed from offset 0.
    pub async fn run(&self, resume: bool) -> Result<IndexReport> {
        let started = Instant::now();
        let page_size = self.config.indexer.page_size;

        let total = records::count(&self.http, &self.config.record_store)
            .await
            .context("Failed to count records to index")?;

        let resumed_from = if resume {
            let stats = self.index.stats().await.context("Failed to read index stats")?;
            let boundary = resume_offset(stats.total_vector_count, page_size);
            if boundary > 0 {
                tracing::info!(
                    "Resuming: index holds {} vectors, starting at offset {boundary}",
                    stats.total_vector_count
                );
            }
            boundary
        } else {
            0
        };

        tracing::info!("Indexing {total} records (page size {page_size}), starting at {resumed_from}");

        let mut offset = resumed_from;
        let mut scanned = 0usize;
        let mut indexed = 0usize;
        let mut pages = 0usize;

        loop {
            let page =
                records::fetch_page(&self.http, &self.config.record_store, offset, page_size as u32)
                    .await
                    .with_context(|| format!("Failed to fetch page at offset {offset}"))?;
            if page.is_empty() {
                break;
            }
            pages += 1;
            scanned += page.len();

            indexed += self.index_page(&page).await?;

            tracing::info!(
                "Indexed page {pages}: {} records ({} of {total})",
                page.len(),
                offset + page.len() as u64
            );

            let full_page = page.len() == page_size;
            offset += page.len() as u64;
            if !full_page {
                break;
            }
        }

        let report = IndexReport {
            scanned,
            indexed,
            pages,
            resumed_from,
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "Indexing complete: {} of {} records upserted in {} pages ({} ms)",
            report.indexed,
            report.scanned,
            report.pages,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Embed one page of records and upsert the vectors in batches.
    async fn index_page(&self, page: &[crate::models::PropertyRecord]) -> Result<usize> {
        let texts: Vec<String> = page.iter().map(describe::synthesize).collect();

        let vectors_raw = embeddings::embed_batch(&self.http, &self.config.llm, &texts)
            .await
            .context("Failed to embed page")?;
        if vectors_raw.len() != page.len() {
            tracing::warn!(
                "Embedding API returned {} vectors for {} records; extra records skipped",
                vectors_raw.len(),
                page.len()
            );
        }

        let vectors: Vec<VectorRecord> = page
            .iter()
            .zip(vectors_raw)
            .map(|(record, values)| VectorRecord {
                id: record.id.clone(),
                values,
                metadata: IndexMetadata::from(record),
            })
            .collect();

        let mut acknowledged = 0usize;
        for batch in vectors.chunks(self.config.indexer.upsert_batch_size) {
            acknowledged += self
                .index
                .upsert(batch)
                .await
                .context("Failed to upsert batch")?;

            if self.config.indexer.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.indexer.batch_delay_ms))
                    .await;
            }
        }
        Ok(acknowledged)
    }

    /// Remove listings from the index, for records deleted from the store.
    pub async fn remove(&self, ids: &[String]) -> Result<()> {
        self.index
            .delete(ids)
            .await
            .context("Failed to delete vectors")?;
        tracing::info!("Removed {} vectors from the index", ids.len());
        Ok(())
    }
}

/// Starting offset for a resumed run: the index's vector count rounded down
/// to a page boundary. A partially-written page and a count that lags
/// recent upserts both resolve to re-doing that page.
fn resume_offset(vector_count: u64, page_size: usize) -> u64 {
    (vector_count / page_size as u64) * page_size as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_offset_rounds_down_to_page_boundary() {
        assert_eq!(resume_offset(0, 50), 0);
        assert_eq!(resume_offset(49, 50), 0);
        assert_eq!(resume_offset(50, 50), 50);
        assert_eq!(resume_offset(149, 50), 100);
        assert_eq!(resume_offset(150, 50), 150);
    }
}
