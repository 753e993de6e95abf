use tracing_subscriber::EnvFilter;

use inmo_search::config::Config;
use inmo_search::indexer::IndexingJob;

/// Offline indexing worker: embeds every listing's synthesized description
/// and upserts the vectors into the hosted index. Safe to re-run; resumes
/// from where the last run stopped unless INMO_INDEXER_RESUME=0.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    tracing::info!("Vector index: {}", config.vector_index.base_url);
    tracing::info!("Record store: {}", config.record_store.base_url);

    let resume = std::env::var("INMO_INDEXER_RESUME")
        .map(|v| v != "0" && v != "false")
        .unwrap_or(true);

    let job = IndexingJob::new(config)?;
    let report = job.run(resume).await?;

    tracing::info!(
        "Done: scanned={} indexed={} pages={} resumed_from={} elapsed_ms={}",
        report.scanned,
        report.indexed,
        report.pages,
        report.resumed_from,
        report.elapsed_ms
    );
    Ok(())
}
