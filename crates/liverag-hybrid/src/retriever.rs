use std::sync::Arc;

use liverag_core::error::{Error, Result};
use liverag_core::traits::{DenseSearch, SparseSearch};
use liverag_core::types::{CandidateRecord, SearchMatch, SourceKind};

/// Issues one dense and one sparse search per query and normalizes both.
#[derive(Clone)]
pub struct Retriever {
    dense: Arc<dyn DenseSearch>,
    sparse: Arc<dyn SparseSearch>,
}

impl Retriever {
    pub fn new(dense: Arc<dyn DenseSearch>, sparse: Arc<dyn SparseSearch>) -> Self {
        Self { dense, sparse }
    }

    /// Returns `(dense, sparse)` in back-end order. Both searches run
    /// concurrently; the first failure aborts the query.
    pub async fn retrieve_hybrid(&self, query: &str, top_k: usize) -> Result<(Vec<CandidateRecord>, Vec<CandidateRecord>)> {
        let dense = async {
            self.dense
                .search(query, top_k)
                .await
                .map_err(|e| Error::retrieval(SourceKind::Dense, &e))
        };
        let sparse = async {
            self.sparse
                .search(query, top_k)
                .await
                .map_err(|e| Error::retrieval(SourceKind::Sparse, &e))
        };
        let (dense, sparse) = tokio::try_join!(dense, sparse)?;
        let dense = normalize(dense, SourceKind::Dense);
        let sparse = normalize(sparse, SourceKind::Sparse);
        tracing::debug!(dense = dense.len(), sparse = sparse.len(), top_k, "retrieved candidates");
        Ok((dense, sparse))
    }
}

/// Malformed matches are dropped, not fatal.
fn normalize(matches: Vec<SearchMatch>, source: SourceKind) -> Vec<CandidateRecord> {
    matches
        .into_iter()
        .filter_map(|m| match CandidateRecord::from_match(m, source) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(%source, error = %e, "dropping candidate");
                None
            }
        })
        .collect()
}
