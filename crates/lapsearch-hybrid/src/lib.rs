use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use lapsearch_core::config::SearchSettings;
use lapsearch_core::error::{Error, Result, Stage};
use lapsearch_core::traits::{check_dim, CandidateStore, CorpusSource, Embedder, LexicalRetriever, QueryParser, Reranker};
use lapsearch_core::types::{Candidate, SearchHit, SearchResult, StoreMatch};
use lapsearch_core::LaptopFields;
use lapsearch_query::normalize;
use lapsearch_vector::{provision, ProvisionOptions, ProvisionOutcome};

pub mod blend;
pub mod fusion;

pub use blend::blend;
pub use fusion::{fuse, CandidatePool};

/// Per-call knobs; defaults come from `[search]` in the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub rerank_top: usize,
    pub alpha: f32,
}

impl From<&SearchSettings> for SearchOptions {
    fn from(s: &SearchSettings) -> Self { Self { top_k: s.top_k, rerank_top: s.rerank_top, alpha: s.alpha } }
}

impl Default for SearchOptions {
    fn default() -> Self { Self::from(&SearchSettings::default()) }
}

impl SearchOptions {
    pub fn with_alpha(self, alpha: f32) -> Self { Self { alpha, ..self } }
    pub fn with_limit(self, rerank_top: usize) -> Self { Self { rerank_top, ..self } }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidConfig(format!("alpha must be within [0, 1], got {}", self.alpha)));
        }
        if self.top_k == 0 || self.rerank_top == 0 {
            return Err(Error::InvalidConfig("top_k and rerank_top must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query_sentence: String,
    pub fields: LaptopFields,
    pub results: Vec<SearchResult>,
    pub relevance_floor: f32,
}

impl SearchResponse {
    pub fn top_score(&self) -> Option<f32> { self.results.first().map(|r| r.final_score) }

    /// False when nothing came back or the best score is under the floor.
    pub fn is_relevant(&self) -> bool { self.top_score().is_some_and(|s| s >= self.relevance_floor) }
}

/// Keeps typed failures as they are and names the stage for everything else.
fn in_stage(stage: Stage, e: Error) -> Error {
    match e {
        Error::DimensionMismatch { .. } | Error::EmptyCorpus | Error::NotFound(_) | Error::RerankerUnavailable(_) => e,
        other => Error::stage(stage, other),
    }
}

pub struct HybridSearchEngine<L, S> where L: LexicalRetriever, S: CandidateStore {
    lexical: L,
    store: S,
    embedder: Box<dyn Embedder>,
    reranker: Box<dyn Reranker>,
    parser: Box<dyn QueryParser>,
    corpus: Arc<dyn CorpusSource>,
    settings: SearchSettings,
}

impl<L, S> HybridSearchEngine<L, S> where L: LexicalRetriever, S: CandidateStore {
    pub fn new(
        lexical: L,
        store: S,
        embedder: Box<dyn Embedder>,
        reranker: Box<dyn Reranker>,
        parser: Box<dyn QueryParser>,
        corpus: Arc<dyn CorpusSource>,
        settings: SearchSettings,
    ) -> Self {
        Self { lexical, store, embedder, reranker, parser, corpus, settings }
    }

    pub fn default_options(&self) -> SearchOptions { SearchOptions::from(&self.settings) }

    /// Creates and loads the vector index from the corpus when it is empty.
    pub fn provision(&self, opts: &ProvisionOptions) -> Result<ProvisionOutcome> {
        provision(&self.store, self.embedder.as_ref(), self.corpus.documents(), opts)
    }

    /// Normalizes free text and runs the full pipeline on the resulting sentence.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<SearchResponse> {
        let normalized = normalize(self.parser.as_ref(), query);
        let results = self.search_sentence(&normalized.sentence, opts)?;
        Ok(SearchResponse { query_sentence: normalized.sentence, fields: normalized.fields, results, relevance_floor: self.settings.relevance_floor })
    }

    /// Retrieve both ways in parallel, fuse, re-rank once, blend and truncate.
    pub fn search_sentence(&self, sentence: &str, opts: &SearchOptions) -> Result<Vec<SearchResult>> {
        opts.validate()?;
        let start = Instant::now();
        let (semantic, lexical) = std::thread::scope(|s| {
            let semantic = s.spawn(|| self.retrieve_semantic(sentence, opts.top_k));
            let lexical = self.retrieve_lexical(sentence, opts.top_k);
            let semantic = semantic
                .join()
                .unwrap_or_else(|_| Err(Error::stage(Stage::SemanticRetrieval, "semantic retrieval panicked")));
            (semantic, lexical)
        });
        let (semantic, lexical) = (semantic?, lexical?);
        tracing::debug!(semantic = semantic.len(), lexical = lexical.len(), elapsed_ms = start.elapsed().as_millis() as u64, "retrieved");

        let pool = fuse(&semantic, &lexical);
        if pool.is_empty() { return Ok(Vec::new()); }
        let mut candidates = pool.into_candidates();
        let scores = self.rerank(sentence, &candidates)?;
        for (c, s) in candidates.iter_mut().zip(scores) { c.semantic_score = s; }

        let ranked = blend(candidates, opts.alpha, self.settings.normalization, opts.rerank_top);
        tracing::debug!(results = ranked.len(), top = ranked.first().map(|c| c.final_score), elapsed_ms = start.elapsed().as_millis() as u64, "search finished");
        Ok(ranked.into_iter().map(SearchResult::from).collect())
    }

    fn retrieve_semantic(&self, sentence: &str, k: usize) -> Result<Vec<StoreMatch>> {
        let vector = self
            .embedder
            .embed_batch(&[sentence.to_string()])
            .map_err(|e| Error::stage(Stage::Embed, e))?
            .pop()
            .ok_or_else(|| Error::stage(Stage::Embed, "embedder returned no vector"))?;
        check_dim(self.store.dim(), vector.len())?;
        self.store.query(&vector, k).map_err(|e| in_stage(Stage::SemanticRetrieval, e))
    }

    fn retrieve_lexical(&self, sentence: &str, k: usize) -> Result<Vec<SearchHit>> {
        self.lexical.search(self.corpus.documents(), sentence, k).map_err(|e| in_stage(Stage::LexicalScoring, e))
    }

    fn rerank(&self, sentence: &str, candidates: &[Candidate]) -> Result<Vec<f32>> {
        let start = Instant::now();
        let pairs: Vec<(String, String)> = candidates.iter().map(|c| (sentence.to_string(), c.text.clone())).collect();
        let scores = self.reranker.batch_score(&pairs).map_err(|e| Error::RerankerUnavailable(format!("{e:#}")))?;
        if scores.len() != pairs.len() {
            return Err(Error::RerankerUnavailable(format!("expected {} scores, got {}", pairs.len(), scores.len())));
        }
        tracing::debug!(pairs = pairs.len(), elapsed_ms = start.elapsed().as_millis() as u64, "re-ranked");
        Ok(scores)
    }
}
