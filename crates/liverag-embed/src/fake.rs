//! Deterministic stand-ins for the neural models, for tests and offline runs.
use anyhow::Result;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use liverag_core::traits::{Embedder, RelevanceScorer};

/// Hashes whitespace tokens into a fixed-size, L2-normalized vector.
/// Identical texts always produce identical vectors.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Scores a text by the fraction of distinct query terms it contains.
#[derive(Default)]
pub struct FakeScorer;

fn terms(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl RelevanceScorer for FakeScorer {
    fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        let q = terms(query);
        if q.is_empty() { return Ok(vec![0.0; texts.len()]); }
        Ok(texts
            .iter()
            .map(|t| {
                let doc = terms(t);
                q.iter().filter(|term| doc.contains(*term)).count() as f32 / q.len() as f32
            })
            .collect())
    }
}
