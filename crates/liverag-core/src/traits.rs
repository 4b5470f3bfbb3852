//! Narrow interfaces the pipeline consumes from its collaborators.
//!
//! Back-ends report failures as `anyhow::Error`; the pipeline maps them into
//! its own [`crate::error::Error`] taxonomy.

use async_trait::async_trait;

use crate::types::{GenerationConfig, SearchMatch};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait DenseSearch: Send + Sync {
    /// Best-first matches for `query`, at most `top_k`.
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchMatch>>;
}

#[async_trait]
pub trait SparseSearch: Send + Sync {
    /// Best-first matches for `query`, at most `top_k`.
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchMatch>>;
}

/// Query/text relevance model. Must return exactly one score per text, in
/// input order.
pub trait RelevanceScorer: Send + Sync {
    fn score_batch(&self, query: &str, texts: &[String]) -> anyhow::Result<Vec<f32>>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> anyhow::Result<String>;
}
