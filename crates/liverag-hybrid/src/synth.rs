use std::sync::Arc;

use liverag_core::error::{Error, Result};
use liverag_core::traits::Generator;
use liverag_core::types::{GenerationConfig, RerankedCandidate};

pub const DOC_DELIMITER: &str = "---";
pub const DEFAULT_ANSWER_TOKEN_BUDGET: u32 = 300;

/// Final answer together with the exact prompt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub prompt: String,
    pub answer: String,
}

/// Two-stage prompting: pull relevant sentences out of the top documents,
/// then answer from those sentences alone.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
    extraction: GenerationConfig,
    answer: GenerationConfig,
    answer_token_budget: u32,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            extraction: GenerationConfig::extraction(),
            answer: GenerationConfig::answer(),
            answer_token_budget: DEFAULT_ANSWER_TOKEN_BUDGET,
        }
    }

    pub fn with_configs(mut self, extraction: GenerationConfig, answer: GenerationConfig) -> Self {
        self.extraction = extraction;
        self.answer = answer;
        self
    }

    pub fn with_token_budget(mut self, budget: u32) -> Self {
        self.answer_token_budget = budget;
        self
    }

    pub fn extraction_prompt(query: &str, docs: &[RerankedCandidate]) -> String {
        let mut prompt = format!(
            "Given the following query and document chunks, extract every sentence that helps answer the query or is relevant to answering it. Put each sentence on its own line.\n\nQuery: {query}\n\nDocument chunks:"
        );
        for doc in docs {
            let text = doc.text().trim().replace('\n', " ");
            prompt.push('\n');
            prompt.push_str(DOC_DELIMITER);
            prompt.push('\n');
            prompt.push_str(&text);
        }
        prompt
    }

    pub fn synthesis_prompt(&self, query: &str, relevant_chunks: &str) -> String {
        format!(
            "Based on the following relevant information, provide a concise and accurate answer to the query within {} tokens. Use only the information provided.\n\nQuery: {query}\n\nRelevant information:\n{}",
            self.answer_token_budget,
            relevant_chunks.trim()
        )
    }

    /// Extraction stage; returns the raw model output.
    pub async fn extract(&self, query: &str, docs: &[RerankedCandidate]) -> Result<String> {
        let prompt = Self::extraction_prompt(query, docs);
        self.generate(&prompt, &self.extraction).await
    }

    /// Synthesis stage over the extraction output.
    pub async fn synthesize(&self, query: &str, relevant_chunks: &str) -> Result<Synthesis> {
        let prompt = self.synthesis_prompt(query, relevant_chunks);
        let answer = self.generate(&prompt, &self.answer).await?;
        Ok(Synthesis { prompt, answer })
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let text = self.generator.generate(prompt, config).await.map_err(|e| Error::generation(&e))?;
        if text.trim().is_empty() {
            return Err(Error::Generation("model returned an empty response".to_string()));
        }
        Ok(text)
    }
}
