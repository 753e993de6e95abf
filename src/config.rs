use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding + generative text provider configuration
    pub llm: LlmConfig,
    /// Vector index service configuration
    pub vector_index: VectorIndexConfig,
    /// Record store (system of record) configuration
    pub record_store: RecordStoreConfig,
    /// Search pipeline tuning knobs
    pub search: SearchTuning,
    /// Offline indexing job configuration
    pub indexer: IndexerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for analysis generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
        }
    }
}

/// Configuration for the Pinecone-compatible vector index service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Index endpoint, e.g. "https://listings-abc123.svc.pinecone.io"
    pub base_url: String,
    pub api_key: Option<String>,
    /// Optional namespace; all operations stay inside it when set.
    pub namespace: Option<String>,
    /// Per-request timeout in seconds (capped at 60).
    pub timeout_secs: u64,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            api_key: None,
            namespace: None,
            timeout_secs: 20,
        }
    }
}

/// Configuration for the relational collaborator's internal batch API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    pub base_url: String,
    /// Service bearer token for the internal endpoints.
    pub api_token: Option<String>,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTuning {
    /// Result count when the caller does not pass a limit
    pub default_limit: usize,
    /// Hard cap on the caller-supplied limit
    pub max_limit: usize,
    /// topK asked of the index = limit × this factor, to absorb ids later
    /// dropped for having no canonical record
    pub overfetch_factor: usize,
    /// Matches scoring below this are discarded before the record fetch
    pub min_score: f32,
    /// Allow the generative analysis path (fallback summary always exists)
    pub analysis_enabled: bool,
    /// Deadline over the whole remote chain of one search request
    pub request_timeout_secs: u64,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            overfetch_factor: 2,
            min_score: 0.25,
            analysis_enabled: true,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Records fetched from the record store per page
    pub page_size: usize,
    /// Vectors per upsert request
    pub upsert_batch_size: usize,
    /// Pause after each upsert batch, to stay under service rate limits
    pub batch_delay_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            upsert_batch_size: 100,
            batch_delay_ms: 200,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            vector_index: VectorIndexConfig::default(),
            record_store: RecordStoreConfig::default(),
            search: SearchTuning::default(),
            indexer: IndexerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }

        if let Ok(url) = std::env::var("VECTOR_INDEX_URL") {
            config.vector_index.base_url = url;
        }
        if let Ok(key) = std::env::var("VECTOR_INDEX_API_KEY") {
            config.vector_index.api_key = Some(key);
        }
        if let Ok(ns) = std::env::var("VECTOR_INDEX_NAMESPACE") {
            config.vector_index.namespace = Some(ns);
        }
        if let Ok(val) = std::env::var("VECTOR_INDEX_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.vector_index.timeout_secs = v.min(60);
            }
        }

        if let Ok(url) = std::env::var("RECORD_STORE_URL") {
            config.record_store.base_url = url;
        }
        if let Ok(token) = std::env::var("RECORD_STORE_TOKEN") {
            config.record_store.api_token = Some(token);
        }

        if let Ok(val) = std::env::var("INMO_SEARCH_DEFAULT_LIMIT") {
            if let Ok(v) = val.parse() {
                config.search.default_limit = v;
            }
        }
        if let Ok(val) = std::env::var("INMO_SEARCH_MAX_LIMIT") {
            if let Ok(v) = val.parse::<usize>() {
                config.search.max_limit = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("INMO_SEARCH_OVERFETCH_FACTOR") {
            if let Ok(v) = val.parse::<usize>() {
                config.search.overfetch_factor = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("INMO_SEARCH_MIN_SCORE") {
            if let Ok(v) = val.parse() {
                config.search.min_score = v;
            }
        }
        if let Ok(val) = std::env::var("INMO_SEARCH_ANALYSIS") {
            config.search.analysis_enabled = val != "0" && val != "false" && val != "off";
        }
        if let Ok(val) = std::env::var("INMO_SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.search.request_timeout_secs = v;
            }
        }

        if let Ok(val) = std::env::var("INMO_INDEXER_PAGE_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.indexer.page_size = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("INMO_INDEXER_BATCH_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.indexer.upsert_batch_size = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("INMO_INDEXER_BATCH_DELAY_MS") {
            if let Ok(v) = val.parse() {
                config.indexer.batch_delay_ms = v;
            }
        }

        config
    }
}
