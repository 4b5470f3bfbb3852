use liverag_core::error::Result;
use liverag_core::types::RerankedCandidate;

use crate::fusion::fuse;
use crate::rerank::Reranker;
use crate::retriever::Retriever;

/// Retrieve from both sources, fuse with RRF, then rerank.
#[derive(Clone)]
pub struct HybridSearch {
    retriever: Retriever,
    reranker: Reranker,
}

impl HybridSearch {
    pub fn new(retriever: Retriever, reranker: Reranker) -> Self {
        Self { retriever, reranker }
    }

    /// `rrf_k` is both the per-source retrieval depth and the fusion constant,
    /// so the reranker never scores more than `rrf_k` candidates.
    pub async fn merge_search_with_reranking(&self, query: &str, top_k: usize, rrf_k: usize) -> Result<Vec<RerankedCandidate>> {
        let (dense, sparse) = self.retriever.retrieve_hybrid(query, rrf_k).await?;
        let fused = fuse(&dense, &sparse, rrf_k);
        tracing::debug!(fused = fused.len(), rrf_k, "fused candidates");
        self.reranker.rerank(query, fused, top_k).await
    }
}
