//! Semantic memory: embedding-backed store/find over a vector database.

pub mod bridge;
pub mod collections;
pub mod filter;
pub mod qdrant;
pub mod traits;
pub mod types;

// Re-export key types for convenience
pub use bridge::{BridgeOptions, MemoryBridge};
pub use collections::CollectionManager;
pub use filter::FilterExpr;
pub use qdrant::QdrantConnector;
pub use traits::VectorStore;
pub use types::{DistanceMetric, Entry, Metadata, SearchResult, StoredPoint};
