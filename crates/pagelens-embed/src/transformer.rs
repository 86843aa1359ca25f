//! Sentence-transformer backend running a BERT-family encoder with candle.
//!
//! Expects a local model directory laid out like a Hugging Face snapshot of
//! `sentence-transformers/all-MiniLM-L6-v2`: `config.json`, `tokenizer.json`
//! and either `model.safetensors` or `pytorch_model.bin`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use pagelens_core::traits::EmbeddingBackend;
use pagelens_core::types::Vector;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

pub struct TransformerBackend {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    name: String,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl TransformerBackend {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.is_dir() {
            bail!("model directory {} does not exist", model_dir.display());
        }
        tracing::info!(dir = %model_dir.display(), "loading transformer model");
        let device = select_device();

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let shape: serde_json::Value = serde_json::from_str(&raw_config)?;
        let dim = json_usize(&shape, "hidden_size")?;
        let max_positions = json_usize(&shape, "max_position_embeddings")?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;

        let pad_id = tokenizer.get_padding().map_or(0, |p| p.pad_id);
        let label = model_dir.file_name().map_or_else(|| "model".to_string(), |n| n.to_string_lossy().into_owned());
        tracing::info!(dim, "transformer model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            name: format!("transformer:{label}"),
            dim,
            max_len: max_len.min(max_positions),
            pad_id,
        })
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vector> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis(), "encoded batch");
        Ok(rows)
    }
}

impl EmbeddingBackend for TransformerBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.encode_batch(texts)
    }
}

fn json_usize(value: &serde_json::Value, key: &str) -> Result<usize> {
    value
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| anyhow!("config.json is missing '{}'", key))
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    bail!("no model.safetensors or pytorch_model.bin under {}", model_dir.display())
}
