pub mod engine;
pub mod merge;

pub use engine::{Readiness, SearchEngine};
pub use merge::merge_results;
