//! liverag-vector
//!
//! Dense retrieval back-ends: a local LanceDB table and the Pinecone HTTP
//! API. Both embed the query with the injected [`Embedder`](liverag_core::traits::Embedder).
pub mod pinecone;
pub mod schema;
pub mod search;

pub use pinecone::PineconeClient;
pub use schema::chunk_schema;
pub use search::{batch_to_matches, LanceDenseSearch};
