use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use lapsearch_core::config::ModelSettings;
use lapsearch_core::error::Error;
use lapsearch_core::traits::Reranker;

use crate::device::select_device;
use crate::tokenize::encode_batch;
use crate::{env_flag, load_config, load_tensors, load_tokenizer, resolve_model_dir};

/// BERT sequence classifier scoring (query, document) pairs with one logit.
pub struct CrossEncoder { bert: BertModel, pooler: Linear, classifier: Linear, tokenizer: Tokenizer, device: Device, max_len: usize }

impl CrossEncoder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer = load_tokenizer(model_dir)?;
        let config = load_config(model_dir)?;
        let vb = VarBuilder::from_tensors(load_tensors(model_dir, &device)?, DType::F32, &device);
        Self::new(vb, &config, tokenizer, max_len)
    }

    /// Builds the classifier from weights laid out as a HF
    /// `BertForSequenceClassification` with a single label.
    pub fn new(vb: VarBuilder, config: &BertConfig, tokenizer: Tokenizer, max_len: usize) -> Result<Self> {
        let device = vb.device().clone();
        let bert = BertModel::load(vb.pp("bert"), config)?;
        let h = config.hidden_size;
        let pooler = linear(h, h, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(h, 1, vb.pp("classifier"))?;
        Ok(Self { bert, pooler, classifier, tokenizer, device, max_len })
    }

    fn logits(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        let inputs: Vec<(&str, &str)> = pairs.iter().map(|(q, d)| (q.as_str(), d.as_str())).collect();
        let batch = encode_batch(&self.tokenizer, inputs, self.max_len, &self.device)?;
        let hidden = self.bert.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits: Tensor = self.classifier.forward(&pooled)?.squeeze(1)?;
        Ok(logits.to_device(&Device::Cpu)?.to_vec1()?)
    }
}

impl Reranker for CrossEncoder {
    fn batch_score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        if pairs.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let scores = self.logits(pairs)?;
        tracing::debug!(pairs = pairs.len(), elapsed_ms = start.elapsed().as_millis() as u64, "re-ranked batch");
        Ok(scores)
    }
}

/// Model-free re-ranker: query-term overlap mapped onto [-10, 10].
#[derive(Default)]
pub struct FakeReranker;

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase).collect()
}

impl Reranker for FakeReranker {
    fn batch_score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, doc)| {
                let q = terms(query);
                if q.is_empty() { return -10.0; }
                let d = terms(doc);
                let frac = q.iter().filter(|t| d.contains(*t)).count() as f32 / q.len() as f32;
                20.0 * frac - 10.0
            })
            .collect())
    }
}

/// Same selection rules as [`crate::get_default_embedder`], keyed on
/// `APP_USE_FAKE_RERANKER` and `reranker_dir`. A model that cannot be
/// located or loaded is reported as [`Error::RerankerUnavailable`].
pub fn get_default_reranker(settings: &ModelSettings) -> lapsearch_core::Result<Box<dyn Reranker>> {
    if settings.use_fake_reranker || env_flag("APP_USE_FAKE_RERANKER") {
        tracing::info!("using FakeReranker");
        return Ok(Box::new(FakeReranker));
    }
    let encoder = resolve_model_dir(&settings.reranker_dir, "APP_RERANKER_DIR")
        .and_then(|dir| CrossEncoder::load(&dir, settings.max_len))
        .map_err(|e| Error::RerankerUnavailable(format!("{e:#}")))?;
    Ok(Box::new(encoder))
}
