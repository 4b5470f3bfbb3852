use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};

/// Token tensors for one padded batch, each `[B,T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Load `tokenizer.json` and force batch padding plus truncation to `max_len`.
pub fn load_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    if tokenizer.get_padding().is_none() {
        let (pad_id, pad_token) = ["<pad>", "[PAD]"]
            .iter()
            .find_map(|t| tokenizer.token_to_id(t).map(|id| (id, (*t).to_string())))
            .unwrap_or((0, "[PAD]".to_string()));
        tokenizer.with_padding(Some(PaddingParams { pad_id, pad_token, ..Default::default() }));
    }
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(tokenizer)
}

/// Encode single texts (bi-encoder input).
pub fn encode_texts(tokenizer: &Tokenizer, texts: &[String], device: &Device) -> Result<EncodedBatch> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_tensors(&encodings, device)
}

/// Encode `(query, text)` pairs (cross-encoder input).
pub fn encode_pairs(tokenizer: &Tokenizer, query: &str, texts: &[String], device: &Device) -> Result<EncodedBatch> {
    let pairs: Vec<(String, String)> = texts.iter().map(|t| (query.to_string(), t.clone())).collect();
    let encodings = tokenizer
        .encode_batch(pairs, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_tensors(&encodings, device)
}

fn to_tensors(encodings: &[Encoding], device: &Device) -> Result<EncodedBatch> {
    let batch = encodings.len();
    let seq = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
    let mut ids = Vec::with_capacity(batch * seq);
    let mut mask = Vec::with_capacity(batch * seq);
    let mut types = Vec::with_capacity(batch * seq);
    for enc in encodings {
        if enc.get_ids().len() != seq {
            return Err(anyhow!("batch is not padded to a common length"));
        }
        ids.extend_from_slice(enc.get_ids());
        mask.extend_from_slice(enc.get_attention_mask());
        types.extend_from_slice(enc.get_type_ids());
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, seq), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, seq), device)?,
        token_type_ids: Tensor::from_vec(types, (batch, seq), device)?,
    })
}
