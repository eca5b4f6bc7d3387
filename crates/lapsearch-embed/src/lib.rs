use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use lapsearch_core::config::{expand_path, ModelSettings};
use lapsearch_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod rerank;
pub mod tokenize;

pub use pool::masked_mean_l2;
pub use rerank::{get_default_reranker, CrossEncoder, FakeReranker};

use device::select_device;
use tokenize::encode_batch;

/// BERT-family sentence-transformer: mean pooled, L2 normalised.
pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sentence embedder");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: BertConfig = load_config(model_dir)?;
        let vb = VarBuilder::from_tensors(load_tensors(model_dir, &device)?, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim = config.hidden_size, "sentence embedder loaded");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len })
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let batch = encode_batch(&self.tokenizer, inputs, self.max_len, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let out: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(n = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

/// Hashed bag-of-words embedder: deterministic and model-free.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim } } }

impl FakeEmbedder {
    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Picks the fake embedder when `APP_USE_FAKE_EMBEDDINGS` or the setting asks
/// for it, otherwise loads the model from `embedder_dir`.
pub fn get_default_embedder(settings: &ModelSettings, dim: usize) -> Result<Box<dyn Embedder>> {
    if settings.use_fake_embeddings || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        tracing::info!(dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(dim)));
    }
    let dir = resolve_model_dir(&settings.embedder_dir, "APP_EMBEDDER_DIR")?;
    Ok(Box::new(SentenceEmbedder::load(&dir, settings.max_len)?))
}

pub(crate) fn resolve_model_dir(configured: &str, env_override: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(env_override) {
        let p = expand_path(&dir);
        if p.exists() { return Ok(p); }
        tracing::warn!(var = env_override, path = %p.display(), "model dir override does not exist");
    }
    let p = expand_path(configured);
    if p.exists() { return Ok(p); }
    Err(anyhow!("Could not locate model directory {}", p.display()))
}

pub(crate) fn load_tokenizer(dir: &Path) -> Result<Tokenizer> {
    let path = dir.join("tokenizer.json");
    Tokenizer::from_file(&path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

pub(crate) fn load_config(dir: &Path) -> Result<BertConfig> {
    let path = dir.join("config.json");
    let raw = std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Prefers `model.safetensors`, falls back to `pytorch_model.bin`.
pub(crate) fn load_tensors(dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let st = dir.join("model.safetensors");
    if st.exists() { return Ok(candle_core::safetensors::load(&st, device)?); }
    let bin = dir.join("pytorch_model.bin");
    Ok(candle_core::pickle::read_all(&bin)?.into_iter().collect())
}
