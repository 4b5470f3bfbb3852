use std::collections::HashMap;

use liverag_core::types::{CandidateRecord, FusedCandidate};

/// Reciprocal rank fusion of a dense and a sparse ranking.
///
/// Each record contributes `1 / (k + rank)` (zero-based rank) to its `id`.
/// Dense is folded before sparse and the record kept for an `id` is the last
/// one seen, so sparse metadata wins when both lists share an id. Ties keep
/// first-insertion order. At most `k` candidates are returned.
pub fn fuse(dense: &[CandidateRecord], sparse: &[CandidateRecord], k: usize) -> Vec<FusedCandidate> {
    if k == 0 {
        return Vec::new();
    }
    let mut fused: Vec<FusedCandidate> = Vec::with_capacity(dense.len() + sparse.len());
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for list in [dense, sparse] {
        for (rank, record) in list.iter().enumerate() {
            let contribution = 1.0 / (k as f64 + rank as f64);
            match slot.get(record.id.as_str()) {
                Some(&i) => {
                    fused[i].fusion_score += contribution;
                    fused[i].record = record.clone();
                }
                None => {
                    slot.insert(record.id.as_str(), fused.len());
                    fused.push(FusedCandidate { record: record.clone(), fusion_score: contribution });
                }
            }
        }
    }

    // sort_by is stable
    fused.sort_by(|a, b| b.fusion_score.total_cmp(&a.fusion_score));
    fused.truncate(k);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use liverag_core::types::SourceKind;

    fn rec(id: &str, source: SourceKind) -> CandidateRecord {
        CandidateRecord { id: id.into(), document_id: None, text: format!("text {id}"), score: 1.0, source }
    }

    #[test]
    fn zero_k_yields_nothing() {
        assert!(fuse(&[rec("a", SourceKind::Dense)], &[], 0).is_empty());
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let dense = vec![rec("a", SourceKind::Dense)];
        let sparse = vec![rec("b", SourceKind::Sparse)];
        let ids: Vec<_> = fuse(&dense, &sparse, 60).into_iter().map(|f| f.record.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
