//! # inmo-search
//!
//! Natural-language property search for a Mexican real-estate catalog:
//! free-text queries ("casa con alberca en Cancún bajo 3 millones") are
//! turned into structured filters plus an embedding, matched against a
//! hosted vector index, and hydrated from the canonical record store.
//!
//! ## Architecture
//!
//! One serial pipeline per search request:
//!
//! ```text
//!                   ┌──────────────┐
//!                   │  User Query   │
//!                   └───────┬──────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!     ┌─────────────────┐      ┌─────────────────┐
//!     │ Filter Extraction│      │    Embedding     │
//!     │ (regex, bilingual│      │ (Ollama/OpenAI)  │
//!     │  keyword tables) │      └────────┬────────┘
//!     └────────┬────────┘               │
//!              │ PropertyFilter          │ Vec<f32>
//!              ▼                         │
//!     ┌─────────────────┐               │
//!     │ Index Filter DSL │               │
//!     │ ($eq/$gte/$in,   │               │
//!     │  CDMX boroughs)  │               │
//!     └────────┬────────┘               │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │  Vector Index Query      │
//!              │  topK = limit × overfetch│
//!              └────────────┬────────────┘
//!                           │ scored ids
//!                           ▼
//!              ┌─────────────────────────┐
//!              │  Record Store Hydration  │
//!              │  (batch lookup by id)    │
//!              └────────────┬────────────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │  Merge + Rank + Truncate │
//!              │  (drop dangling ids)     │
//!              └────────────┬────────────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │  Market Analysis         │
//!              │  (LLM, deterministic     │
//!              │   fallback on failure)   │
//!              └─────────────────────────┘
//! ```
//!
//! Zero index matches short-circuit into a successful empty response with
//! refinement suggestions. The offline [`indexer`] job feeds the index:
//! it streams the catalog page by page, embeds each listing's synthesized
//! description, and upserts idempotently, resuming from the index's own
//! vector count after an interruption.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the LLM, vector index, record store, and tuning knobs
//! - [`models`] - Shared data types: `PropertyRecord`, `PropertyFilter`, request/response types
//! - [`error`] - The `SearchError` taxonomy the engine reports at its seam
//! - [`extract`] - Regex/keyword extraction of structured filters from free text
//! - [`describe`] - Canonical description synthesis (the exact text that gets embedded)
//! - [`llm`] - Embedding and analysis generation via Ollama or OpenAI-compatible APIs
//! - [`vector`] - Client for the hosted vector index and the filter-DSL translator
//! - [`records`] - Read-only client for the record store's internal batch API
//! - [`search`] - The engine: orchestration, readiness, merging and ranking
//! - [`indexer`] - Resumable offline job that embeds and upserts the whole catalog

pub mod config;
pub mod describe;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod llm;
pub mod models;
pub mod records;
pub mod search;
pub mod vector;
