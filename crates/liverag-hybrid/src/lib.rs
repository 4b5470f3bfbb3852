//! liverag-hybrid
//!
//! The question answering core: concurrent dense + sparse retrieval,
//! reciprocal rank fusion, cross-encoder reranking and two-stage answer
//! generation. Collaborators come in through [`PipelineContext`]; this
//! crate depends only on the traits in `liverag-core`.
pub mod batch;
pub mod fusion;
pub mod pipeline;
pub mod rerank;
pub mod retriever;
pub mod search;
pub mod synth;

pub use batch::{read_queries, write_outputs, BatchFailure, BatchOutput, BatchQuery, BatchReport, BatchRunner, Passage, QueryFile};
pub use fusion::fuse;
pub use pipeline::{PipelineContext, PipelineOptions, PipelineOrchestrator};
pub use rerank::Reranker;
pub use retriever::Retriever;
pub use search::HybridSearch;
pub use synth::{AnswerSynthesizer, Synthesis};
