use std::collections::HashMap;

use lapsearch_core::error::{Error, Result};
use lapsearch_core::traits::LexicalRetriever;
use lapsearch_core::types::{Document, SearchHit};

use crate::tokenize::Analyzer;

/// Sparse, L2-normalised term vector: (term index, weight), sorted by index.
pub type SparseVec = Vec<(usize, f32)>;

/// TF-IDF weights fitted on one corpus snapshot.
///
/// - tf: raw term count
/// - idf: `ln((1 + n) / (1 + df)) + 1`
/// - rows are L2-normalised, so a dot product is a cosine
pub struct TfIdfModel {
	analyzer: Analyzer,
	vocab: HashMap<String, usize>,
	idf: Vec<f32>,
	rows: Vec<SparseVec>,
}

impl TfIdfModel {
	pub fn fit<S: AsRef<str>>(docs: &[S]) -> Result<Self> {
		if docs.is_empty() { return Err(Error::EmptyCorpus); }
		let mut analyzer = Analyzer::default();
		let mut vocab: HashMap<String, usize> = HashMap::new();
		let mut counts: Vec<HashMap<usize, u32>> = Vec::with_capacity(docs.len());
		for doc in docs {
			let mut tf: HashMap<usize, u32> = HashMap::new();
			for tok in analyzer.tokens(doc.as_ref()) {
				let next = vocab.len();
				let idx = *vocab.entry(tok).or_insert(next);
				*tf.entry(idx).or_insert(0) += 1;
			}
			counts.push(tf);
		}
		let mut df = vec![0u32; vocab.len()];
		for tf in &counts { for &idx in tf.keys() { df[idx] += 1; } }
		let n = docs.len() as f32;
		let idf: Vec<f32> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0).collect();
		let rows = counts.into_iter().map(|tf| weigh(tf, &idf)).collect();
		Ok(Self { analyzer, vocab, idf, rows })
	}

	pub fn n_docs(&self) -> usize { self.rows.len() }

	pub fn vocabulary_len(&self) -> usize { self.vocab.len() }

	/// Projects text onto the fitted vocabulary; unseen terms are ignored.
	pub fn transform(&mut self, text: &str) -> SparseVec {
		let mut tf: HashMap<usize, u32> = HashMap::new();
		for tok in self.analyzer.tokens(text) {
			if let Some(&idx) = self.vocab.get(&tok) { *tf.entry(idx).or_insert(0) += 1; }
		}
		weigh(tf, &self.idf)
	}

	/// Relevance of every document to `query`, in corpus order.
	pub fn scores(&mut self, query: &str) -> Vec<f32> {
		let q = self.transform(query);
		self.rows.iter().map(|row| dot(row, &q)).collect()
	}
}

fn weigh(tf: HashMap<usize, u32>, idf: &[f32]) -> SparseVec {
	let mut v: SparseVec = tf.into_iter().map(|(i, c)| (i, c as f32 * idf[i])).collect();
	v.sort_unstable_by_key(|&(i, _)| i);
	let norm = v.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
	if norm > 0.0 { for (_, w) in &mut v { *w /= norm; } }
	v
}

fn dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
	let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
	while i < a.len() && j < b.len() {
		match a[i].0.cmp(&b[j].0) {
			std::cmp::Ordering::Less => i += 1,
			std::cmp::Ordering::Greater => j += 1,
			std::cmp::Ordering::Equal => { acc += a[i].1 * b[j].1; i += 1; j += 1; }
		}
	}
	acc
}

/// Indices of the `k` best scores, descending; ties keep corpus order.
/// Zero scores still qualify.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
	let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
	ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
	ranked.truncate(k);
	ranked
}

/// Lexical retrieval that refits TF-IDF against the corpus on every call.
#[derive(Default)]
pub struct TfIdfRetriever;

impl LexicalRetriever for TfIdfRetriever {
	fn search(&self, corpus: &[Document], query: &str, k: usize) -> Result<Vec<SearchHit>> {
		let sentences: Vec<&str> = corpus.iter().map(|d| d.sentence.as_str()).collect();
		let mut model = TfIdfModel::fit(&sentences)?;
		let scores = model.scores(query);
		tracing::debug!(docs = model.n_docs(), terms = model.vocabulary_len(), "fitted tf-idf");
		Ok(top_k(&scores, k)
			.into_iter()
			.map(|(i, score)| SearchHit { id: corpus[i].id.clone(), score, text: corpus[i].sentence.clone() })
			.collect())
	}
}
