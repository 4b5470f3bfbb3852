#![allow(dead_code)]
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use liverag_core::traits::{DenseSearch, Generator, RelevanceScorer, SparseSearch};
use liverag_core::types::{GenerationConfig, SearchMatch};
use liverag_embed::FakeScorer;
use liverag_hybrid::PipelineContext;

/// Returns a fixed list, ignoring `top_k` so callers can't rely on truncation.
#[derive(Default)]
pub struct StaticSearch {
    pub matches: Vec<SearchMatch>,
    pub requested: AtomicUsize,
    pub fail: bool,
}

impl StaticSearch {
    pub fn new(matches: Vec<SearchMatch>) -> Self {
        Self { matches, ..Default::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    fn respond(&self, top_k: usize) -> Result<Vec<SearchMatch>> {
        self.requested.store(top_k, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.matches.clone())
    }
}

#[async_trait]
impl DenseSearch for StaticSearch {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
        self.respond(top_k)
    }
}

#[async_trait]
impl SparseSearch for StaticSearch {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
        self.respond(top_k)
    }
}

/// Term-overlap scorer that remembers batch sizes and can drop a score for
/// one question.
#[derive(Default)]
pub struct RecordingScorer {
    pub batch_sizes: Mutex<Vec<usize>>,
    pub short_for: Option<String>,
}

impl RelevanceScorer for RecordingScorer {
    fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(texts.len());
        }
        let mut scores = FakeScorer.score_batch(query, texts)?;
        if self.short_for.as_deref() == Some(query) {
            scores.pop();
        }
        Ok(scores)
    }
}

/// Fixed scores in input order.
pub struct FixedScorer(pub Vec<f32>);

impl RelevanceScorer for FixedScorer {
    fn score_batch(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok(self.0.iter().copied().take(texts.len()).collect())
    }
}

pub const EXTRACTED: &str = "Rain forms when water vapour condenses.\nDroplets fall from clouds.";
pub const ANSWER: &str = "Condensation of water vapour in clouds causes rain.";

/// Answers extraction prompts with [`EXTRACTED`] and everything else with [`ANSWER`].
#[derive(Default)]
pub struct ScriptedGenerator {
    pub prompts: Mutex<Vec<(String, u32)>>,
    pub blank_answer: bool,
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push((prompt.to_string(), config.max_tokens));
        }
        if prompt.contains("Document chunks:") {
            Ok(format!("  {EXTRACTED}\n"))
        } else if self.blank_answer {
            Ok(" \n".to_string())
        } else {
            Ok(ANSWER.to_string())
        }
    }
}

pub fn m(id: &str, score: f32, text: &str, doc: Option<&str>) -> SearchMatch {
    SearchMatch::new(id, score, text, doc.map(str::to_string))
}

pub fn rain_dense() -> Vec<SearchMatch> {
    vec![
        m("d1", 0.9, "Clouds are made of tiny water droplets.", Some("doc-1")),
        m("d2", 0.8, "Rain forms when water vapour condenses in clouds.", Some("doc-2")),
    ]
}

pub fn rain_sparse() -> Vec<SearchMatch> {
    vec![
        m("d2", 5.1, "Rain forms when water vapour condenses into droplets.", Some("doc-2b")),
        m("d3", 4.0, "Heavy rain causes floods.", None),
    ]
}

pub fn context(
    dense: Arc<StaticSearch>,
    sparse: Arc<StaticSearch>,
    scorer: Arc<dyn RelevanceScorer>,
    generator: Arc<dyn Generator>,
) -> PipelineContext {
    PipelineContext { dense, sparse, scorer, generator }
}
