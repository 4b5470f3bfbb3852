use anyhow::{Context, Result};
use std::sync::Arc;

use liverag_core::config::{Config, DenseBackend, Settings, SparseBackend};
use liverag_core::traits::{DenseSearch, SparseSearch};
use liverag_embed::{load_query_embedder, load_relevance_scorer};
use liverag_hybrid::PipelineContext;
use liverag_llm::OpenAiCompatibleGenerator;
use liverag_text::{OpenSearchClient, TantivySparseSearch};
use liverag_vector::{LanceDenseSearch, PineconeClient};

/// Load models and open every back-end named in `settings`.
pub async fn build_context(config: &Config, settings: &Settings) -> Result<PipelineContext> {
    let embedder = load_query_embedder(&settings.embedding, &config.resolve_path(&settings.embedding.model_dir))
        .context("loading query embedder")?;

    let dense: Arc<dyn DenseSearch> = match settings.dense.backend {
        DenseBackend::Lancedb => {
            let dir = config.resolve_path(&settings.dense.lancedb_dir);
            Arc::new(LanceDenseSearch::open(&dir, &settings.dense.table, embedder).await?)
        }
        DenseBackend::Pinecone => {
            let host = settings.dense.pinecone_host.as_deref().context("dense.pinecone_host is not set")?;
            Arc::new(PineconeClient::new(
                host,
                &settings.dense.pinecone_namespace,
                settings.dense.api_key.clone(),
                settings.http.timeout_secs,
                embedder,
            )?)
        }
    };

    let sparse: Arc<dyn SparseSearch> = match settings.sparse.backend {
        SparseBackend::Tantivy => Arc::new(TantivySparseSearch::open(&config.resolve_path(&settings.sparse.tantivy_index_dir))?),
        SparseBackend::OpenSearch => {
            let url = settings.sparse.opensearch_url.as_deref().context("sparse.opensearch_url is not set")?;
            Arc::new(OpenSearchClient::new(url, &settings.sparse.index, settings.http.timeout_secs)?)
        }
    };

    let scorer = load_relevance_scorer(&settings.reranker, &config.resolve_path(&settings.reranker.model_dir))
        .context("loading reranker")?;

    let generator = OpenAiCompatibleGenerator::new(
        &settings.generation.base_url,
        &settings.generation.model,
        settings.generation.api_key.clone(),
        settings.generation.timeout_secs,
    )?;

    tracing::info!(dense = ?settings.dense.backend, sparse = ?settings.sparse.backend, model = %settings.generation.model, "pipeline context ready");
    Ok(PipelineContext { dense, sparse, scorer: Arc::from(scorer), generator: Arc::new(generator) })
}
