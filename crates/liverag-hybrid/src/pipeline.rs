use std::sync::Arc;
use std::time::Instant;

use liverag_core::config::Settings;
use liverag_core::error::Result;
use liverag_core::traits::{DenseSearch, Generator, RelevanceScorer, SparseSearch};
use liverag_core::types::{GenerationConfig, PipelineResult};

use crate::rerank::Reranker;
use crate::retriever::Retriever;
use crate::search::HybridSearch;
use crate::synth::{AnswerSynthesizer, DEFAULT_ANSWER_TOKEN_BUDGET};

/// Initialized collaborators, built once per process and shared by every query.
#[derive(Clone)]
pub struct PipelineContext {
    pub dense: Arc<dyn DenseSearch>,
    pub sparse: Arc<dyn SparseSearch>,
    pub scorer: Arc<dyn RelevanceScorer>,
    pub generator: Arc<dyn Generator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub rrf_k: usize,
    pub extraction: GenerationConfig,
    pub answer: GenerationConfig,
    pub answer_token_budget: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            rrf_k: 100,
            extraction: GenerationConfig::extraction(),
            answer: GenerationConfig::answer(),
            answer_token_budget: DEFAULT_ANSWER_TOKEN_BUDGET,
        }
    }
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            rrf_k: settings.retrieval.rrf_k,
            extraction: settings.generation.extraction.clone(),
            answer: settings.generation.answer.clone(),
            answer_token_budget: settings.generation.answer_token_budget,
        }
    }
}

pub struct PipelineOrchestrator {
    search: HybridSearch,
    synthesizer: AnswerSynthesizer,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    pub fn new(ctx: PipelineContext, options: PipelineOptions) -> Self {
        let search = HybridSearch::new(Retriever::new(ctx.dense, ctx.sparse), Reranker::new(ctx.scorer));
        let synthesizer = AnswerSynthesizer::new(ctx.generator)
            .with_configs(options.extraction.clone(), options.answer.clone())
            .with_token_budget(options.answer_token_budget);
        Self { search, synthesizer, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Answer one question. A missing `query_id` falls back to the current
    /// unix time in seconds, which is not unique within a batch.
    pub async fn run(&self, query: &str, query_id: Option<String>) -> Result<PipelineResult> {
        let start = Instant::now();
        let query_id = query_id.unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());
        tracing::info!(%query_id, "running pipeline");

        let top_docs = self
            .search
            .merge_search_with_reranking(query, self.options.top_k, self.options.rrf_k)
            .await?;
        let relevant_chunks = self.synthesizer.extract(query, &top_docs).await?;
        let synthesis = self.synthesizer.synthesize(query, &relevant_chunks).await?;

        let execution_time = start.elapsed();
        tracing::info!(%query_id, docs = top_docs.len(), secs = execution_time.as_secs_f64(), "pipeline finished");
        Ok(PipelineResult {
            query_id,
            query: query.to_string(),
            top_docs,
            relevant_chunks,
            final_prompt: synthesis.prompt,
            answer: synthesis.answer,
            execution_time,
        })
    }
}
