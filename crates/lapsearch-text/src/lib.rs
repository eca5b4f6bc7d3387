//! lapsearch-text
//!
//! Lexical scoring over catalog sentences: a tantivy token pipeline feeding a
//! TF-IDF model that is fitted fresh for every search.

pub mod tfidf;
pub mod tokenize;

pub use tfidf::{top_k, TfIdfModel, TfIdfRetriever};
pub use tokenize::Analyzer;
