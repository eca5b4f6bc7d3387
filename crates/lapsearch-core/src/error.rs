use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embed,
    SemanticRetrieval,
    LexicalScoring,
    Rerank,
    Provision,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Embed => "embed",
            Self::SemanticRetrieval => "semantic_retrieval",
            Self::LexicalScoring => "lexical_scoring",
            Self::Rerank => "rerank",
            Self::Provision => "provision",
            Self::Store => "store",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Lexical scoring needs at least one document")]
    EmptyCorpus,

    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Re-ranker unavailable: {0}")]
    RerankerUnavailable(String),

    /// A collaborator failed after the input was accepted: model inference,
    /// the vector store, a worker thread. The source is opaque, so it is not
    /// known whether the cause is transient.
    #[error("Stage '{stage}' failed: {source}")]
    Stage { stage: Stage, source: BoxError },
}

impl Error {
    pub fn stage(stage: Stage, source: impl Into<BoxError>) -> Self {
        Self::Stage { stage, source: source.into() }
    }

    /// True when retrying the same request may succeed: the re-ranker was
    /// unavailable, or a stage failed for a reason outside the request itself.
    /// Stage failures are retryable but not guaranteed to be transient; a
    /// corrupt index fails the same way on every attempt. Configuration,
    /// catalog, dimension and empty-corpus errors need different input and
    /// are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RerankerUnavailable(_) | Self::Stage { .. })
    }

    /// Stage the failure is attributed to, when known.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::RerankerUnavailable(_) => Some(Stage::Rerank),
            Self::EmptyCorpus => Some(Stage::LexicalScoring),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
