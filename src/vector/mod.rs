pub mod client;
pub mod filter;

pub use client::{IndexMetadata, IndexStats, VectorIndex, VectorMatch, VectorRecord};
pub use filter::to_index_filter;
