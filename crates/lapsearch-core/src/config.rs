//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nesting, e.g.
//! `APP_SEARCH__ALPHA=0.7`). Provides helpers to expand `~` and `${VAR}` and
//! to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub index: IndexSettings,
    pub models: ModelSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub catalog_csv: String,
}

/// Vector store location and shape. The metric is always cosine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub uri: String,
    pub table: String,
    pub dimension: usize,
    pub embed_batch_size: usize,
    pub upsert_batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedder_dir: String,
    pub reranker_dir: String,
    pub max_len: usize,
    pub use_fake_embeddings: bool,
    pub use_fake_reranker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Blend raw re-ranker and lexical scores.
    #[default]
    None,
    /// Rescale each signal to [0, 1] across the candidate pool first.
    MinMax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Candidates requested from each retrieval path.
    pub top_k: usize,
    /// Results kept after blending.
    pub rerank_top: usize,
    /// Weight of the re-ranker score in the blend.
    pub alpha: f32,
    pub relevance_floor: f32,
    pub normalization: ScoreNormalization,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { catalog_csv: "data/laptop_data_cleaned.csv".to_string() }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            uri: "data/indexes/lancedb".to_string(),
            table: "laptop-hybrid-search-v2".to_string(),
            dimension: 768,
            embed_batch_size: 32,
            upsert_batch_size: 200,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedder_dir: "models/bert-base-nli-mean-tokens".to_string(),
            reranker_dir: "models/ms-marco-MiniLM-L-6-v2".to_string(),
            max_len: 256,
            use_fake_embeddings: false,
            use_fake_reranker: false,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: 30,
            rerank_top: 5,
            alpha: 0.5,
            relevance_floor: -5.0,
            normalization: ScoreNormalization::None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let s = &self.search;
        if !(0.0..=1.0).contains(&s.alpha) {
            return Err(Error::InvalidConfig(format!("search.alpha must be within [0, 1], got {}", s.alpha)));
        }
        if s.top_k == 0 || s.rerank_top == 0 {
            return Err(Error::InvalidConfig("search.top_k and search.rerank_top must be positive".into()));
        }
        if !s.relevance_floor.is_finite() {
            return Err(Error::InvalidConfig("search.relevance_floor must be finite".into()));
        }
        if self.index.dimension == 0 {
            return Err(Error::InvalidConfig("index.dimension must be positive".into()));
        }
        if self.index.embed_batch_size == 0 || self.index.upsert_batch_size == 0 {
            return Err(Error::InvalidConfig("index batch sizes must be positive".into()));
        }
        if self.models.max_len == 0 {
            return Err(Error::InvalidConfig("models.max_len must be positive".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Self::base().merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, env_name: env_name.to_string() })
    }

    /// Builds a config from defaults plus one explicit TOML file, skipping
    /// the environment. Used by tests and `--config`.
    pub fn from_file(path: &Path) -> Self {
        Self { figment: Self::base().merge(Toml::file(path)), env_name: "file".to_string() }
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Extracts and validates the typed settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        self.validate_for_env(&settings)?;
        Ok(settings)
    }

    fn validate_for_env(&self, settings: &Settings) -> Result<()> {
        match self.env_name.as_str() {
            "prod" | "production" => {
                if settings.models.use_fake_embeddings || settings.models.use_fake_reranker {
                    return Err(Error::InvalidConfig("fake models are not allowed in production".into()));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
