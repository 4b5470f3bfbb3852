//! Cross-encoder relevance scoring (bge-reranker style).
//!
//! The query and a candidate text are encoded together as a tokenizer pair
//! and a single-logit sequence classifier head produces the relevance score.
//! Scores are raw logits: higher is more relevant, no fixed range.
use anyhow::{anyhow, Result};
use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use std::path::Path;
use tokenizers::Tokenizer;

use liverag_core::traits::RelevanceScorer;

use crate::device::select_device;
use crate::tokenize::{encode_pairs, load_tokenizer};
use crate::weights::{load_var_builder, read_model_config, require_model_dir};

const SCORE_BATCH: usize = 16;

pub struct CrossEncoderScorer {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoderScorer {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let model_dir = require_model_dir(model_dir)?;
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let config: XLMRobertaConfig = read_model_config(&model_dir)?;
        let tokenizer = load_tokenizer(&model_dir, max_len)?;
        let vb = load_var_builder(&model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        Ok(Self { model, tokenizer, device })
    }

    fn score_chunk(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        let batch = encode_pairs(&self.tokenizer, query, texts, &self.device)?;
        let logits = self.model.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids)?;
        let scores: Vec<f32> = logits.squeeze(1)?.to_device(&Device::Cpu)?.to_vec1()?;
        if scores.len() != texts.len() {
            return Err(anyhow!("classifier returned {} scores for {} pairs", scores.len(), texts.len()));
        }
        Ok(scores)
    }
}

impl RelevanceScorer for CrossEncoderScorer {
    fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(SCORE_BATCH) {
            scores.extend(self.score_chunk(query, chunk)?);
        }
        Ok(scores)
    }
}
