//! liverag-embed
//!
//! Local candle models behind the core traits: a BERT query embedder for
//! dense retrieval and an XLM-RoBERTa cross-encoder for reranking. Setting
//! `use_fake` (or `APP_USE_FAKE_EMBEDDINGS=1`) swaps in deterministic fakes
//! so nothing large is loaded in tests and development.
use anyhow::Result;
use std::path::Path;

use liverag_core::config::{EmbeddingSettings, RerankerSettings};
use liverag_core::traits::{Embedder, RelevanceScorer};

pub mod cross_encoder;
pub mod device;
pub mod fake;
pub mod pool;
pub mod query;
pub mod tokenize;
pub mod weights;

pub use cross_encoder::CrossEncoderScorer;
pub use fake::{FakeEmbedder, FakeScorer};
pub use pool::{l2_normalize, masked_mean, masked_mean_l2};
pub use query::BertQueryEmbedder;

pub const FAKE_EMBEDDING_DIM: usize = 768;

fn fake_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the query embedder; `model_dir` is already resolved against the config base.
pub fn load_query_embedder(settings: &EmbeddingSettings, model_dir: &Path) -> Result<Box<dyn Embedder>> {
    if settings.use_fake || fake_forced() {
        tracing::warn!("using FakeEmbedder for queries");
        return Ok(Box::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    Ok(Box::new(BertQueryEmbedder::load(model_dir, &settings.query_prefix, settings.max_len)?))
}

/// Build the relevance scorer; `model_dir` is already resolved against the config base.
pub fn load_relevance_scorer(settings: &RerankerSettings, model_dir: &Path) -> Result<Box<dyn RelevanceScorer>> {
    if settings.use_fake || fake_forced() {
        tracing::warn!("using FakeScorer for reranking");
        return Ok(Box::new(FakeScorer));
    }
    Ok(Box::new(CrossEncoderScorer::load(model_dir, settings.max_len)?))
}
