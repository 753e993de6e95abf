pub mod analysis;
pub mod embeddings;
