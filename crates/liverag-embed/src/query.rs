use anyhow::Result;
use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;

use liverag_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::{encode_texts, load_tokenizer};
use crate::weights::{load_var_builder, read_model_config, require_model_dir};

/// BERT-family bi-encoder (E5 style) used to embed search queries.
///
/// Every input is prefixed with `prefix` (E5 expects `"query: "`), encoded,
/// mean-pooled over the attention mask and L2-normalized.
pub struct BertQueryEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    prefix: String,
    dim: usize,
    max_len: usize,
}

impl BertQueryEmbedder {
    pub fn load(model_dir: &Path, prefix: &str, max_len: usize) -> Result<Self> {
        let model_dir = require_model_dir(model_dir)?;
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading query embedding model");
        let config: BertConfig = read_model_config(&model_dir)?;
        let dim = config.hidden_size;
        let tokenizer = load_tokenizer(&model_dir, max_len)?;
        let vb = load_var_builder(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim, "query embedding model ready");
        Ok(Self { model, tokenizer, device, prefix: prefix.to_string(), dim, max_len })
    }
}

impl Embedder for BertQueryEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let prefixed: Vec<String> = texts.iter().map(|t| format!("{}{}", self.prefix, t)).collect();
        let batch = encode_texts(&self.tokenizer, &prefixed, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(n = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded queries");
        Ok(rows)
    }
}
