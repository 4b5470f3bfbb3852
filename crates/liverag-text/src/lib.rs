//! liverag-text
//!
//! Sparse (keyword) retrieval back-ends: a local tantivy index and a remote
//! OpenSearch cluster. Both only read; building the index happens elsewhere.
pub mod opensearch;
pub mod search;
pub mod tantivy_utils;

pub use opensearch::OpenSearchClient;
pub use search::TantivySparseSearch;
