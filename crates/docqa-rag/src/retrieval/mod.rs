//! Vector index, its persistence, and the ingest/query pipeline

pub mod index;
pub mod pipeline;
pub mod store;

pub use index::{DimensionPolicy, VectorIndex};
pub use pipeline::{RetrievalPipeline, DEFAULT_TOP_K};
pub use store::StorePaths;
