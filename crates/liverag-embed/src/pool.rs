use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Average the hidden states of non-padding tokens: `[B,T,H] x [B,T] -> [B,H]`.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq, dim) = hidden.dims3()?;
    if attention_mask.dims() != [batch, seq] {
        bail!("attention mask shape {:?} does not match hidden states [{batch}, {seq}, {dim}]", attention_mask.dims());
    }
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let weights = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = (hidden * &weights)?.sum(1)?;
    // all-padding rows would divide by zero
    let counts = mask.sum_keepdim(1)?.maximum(1f64)?;
    Ok(summed.broadcast_div(&counts)?)
}

/// Row-wise L2 normalization of a `[B,H]` matrix.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = match rows.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norms = rows.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    Ok(rows.broadcast_div(&norms)?)
}

/// Mean pooling followed by L2 normalization, the E5 sentence embedding recipe.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    l2_normalize(&masked_mean(hidden, attention_mask)?)
}
