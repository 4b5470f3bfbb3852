use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Build a `VarBuilder` from `model.safetensors`, falling back to `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors: HashMap<String, Tensor> = if safetensors.exists() {
        tracing::debug!(path = %safetensors.display(), "loading safetensors weights");
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let pickle = model_dir.join("pytorch_model.bin");
        if !pickle.exists() {
            return Err(anyhow!("no model weights found in {}", model_dir.display()));
        }
        tracing::debug!(path = %pickle.display(), "loading pickled weights");
        candle_core::pickle::read_all(&pickle)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

/// Read a HF `config.json` into the model's config type.
pub fn read_model_config<T: serde::de::DeserializeOwned>(model_dir: &Path) -> Result<T> {
    let path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Check that a model directory exists before any expensive loading starts.
pub fn require_model_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_dir() {
        Ok(dir.to_path_buf())
    } else {
        Err(anyhow!("model directory not found: {}", dir.display()))
    }
}
