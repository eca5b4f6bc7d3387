use crate::error::Result;
use crate::types::{Document, LaptopFields, SearchHit, StoreMatch, StoreStats, VectorRecord};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Pairwise (query, document) relevance model. Scores are unbounded and
/// returned in input order.
pub trait Reranker: Send + Sync {
    fn batch_score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}

/// Vector index holding one row per catalog document.
///
/// Implementations reject vectors whose length differs from `dim()` before
/// touching storage.
pub trait CandidateStore: Send + Sync {
    fn dim(&self) -> usize;
    /// Creates the index if missing. Returns `true` when it was created.
    fn ensure_index(&self) -> Result<bool>;
    fn upsert(&self, records: &[VectorRecord]) -> Result<()>;
    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoreMatch>>;
    fn stats(&self) -> Result<StoreStats>;
}

pub trait LexicalRetriever: Send + Sync {
    fn search(&self, corpus: &[Document], query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Extracts structured fields from free text. Fields that cannot be found
/// come back absent.
pub trait QueryParser: Send + Sync {
    fn parse(&self, text: &str) -> LaptopFields;
}

/// Ordered, stable set of catalog documents.
pub trait CorpusSource: Send + Sync {
    fn documents(&self) -> &[Document];

    fn get(&self, id: &str) -> Option<&Document> {
        self.documents().iter().find(|d| d.id == id)
    }
}

pub fn check_dim(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(crate::error::Error::DimensionMismatch { expected, actual })
    }
}
