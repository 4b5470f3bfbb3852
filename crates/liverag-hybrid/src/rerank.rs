use std::sync::Arc;

use liverag_core::error::{Error, Result};
use liverag_core::traits::RelevanceScorer;
use liverag_core::types::{FusedCandidate, RerankedCandidate};

/// Orders fused candidates by a query-aware relevance model.
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    /// Scores every candidate in a single batch and keeps the best `top_k`.
    /// Equal scores keep input order.
    pub async fn rerank(&self, query: &str, candidates: Vec<FusedCandidate>, top_k: usize) -> Result<Vec<RerankedCandidate>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = candidates.iter().map(|c| c.record.text.clone()).collect();
        let scorer = Arc::clone(&self.scorer);
        let query_owned = query.to_string();
        let scores = tokio::task::spawn_blocking(move || scorer.score_batch(&query_owned, &texts))
            .await
            .map_err(|e| Error::Reranking(format!("scoring task failed: {e}")))?
            .map_err(|e| Error::reranking(&e))?;

        if scores.len() != candidates.len() {
            return Err(Error::Reranking(format!(
                "scorer returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        let mut reranked: Vec<RerankedCandidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(fused, rerank_score)| RerankedCandidate { fused, rerank_score })
            .collect();
        reranked.sort_by(|a, b| b.rerank_score.total_cmp(&a.rerank_score));
        reranked.truncate(top_k);
        Ok(reranked)
    }
}
