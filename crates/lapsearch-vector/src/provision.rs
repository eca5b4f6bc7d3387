use indicatif::{ProgressBar, ProgressStyle};

use lapsearch_core::config::IndexSettings;
use lapsearch_core::error::{Error, Result, Stage};
use lapsearch_core::traits::{check_dim, CandidateStore, Embedder};
use lapsearch_core::types::{Document, VectorRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
	/// The index did not exist; it was created and loaded.
	Created { loaded: usize },
	/// The index existed but was empty.
	Loaded { loaded: usize },
	/// The index already held rows, nothing was written.
	Skipped { existing: usize },
}

#[derive(Debug, Clone)]
pub struct ProvisionOptions { pub embed_batch_size: usize, pub upsert_batch_size: usize, pub show_progress: bool }

impl Default for ProvisionOptions {
	fn default() -> Self { Self { embed_batch_size: 32, upsert_batch_size: 200, show_progress: false } }
}

impl From<&IndexSettings> for ProvisionOptions {
	fn from(s: &IndexSettings) -> Self { Self { embed_batch_size: s.embed_batch_size, upsert_batch_size: s.upsert_batch_size, show_progress: false } }
}

fn provisioning(e: Error) -> Error {
	match e {
		Error::DimensionMismatch { .. } => e,
		other => Error::stage(Stage::Provision, other),
	}
}

/// Makes sure the index exists and, if it is empty, bulk loads every document.
///
/// Running it again against a populated index is a no-op.
pub fn provision(store: &dyn CandidateStore, embedder: &dyn Embedder, docs: &[Document], opts: &ProvisionOptions) -> Result<ProvisionOutcome> {
	check_dim(store.dim(), embedder.dim())?;
	let created = store.ensure_index().map_err(provisioning)?;
	let existing = store.stats().map_err(provisioning)?.count;
	if existing > 0 {
		tracing::info!(existing, "index already populated, skipping load");
		return Ok(ProvisionOutcome::Skipped { existing });
	}

	let pb = if opts.show_progress { ProgressBar::new(docs.len() as u64) } else { ProgressBar::hidden() };
	if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%)") {
		pb.set_style(style.progress_chars("#>-"));
	}
	let upsert_batch = opts.upsert_batch_size.max(1);
	let mut pending: Vec<VectorRecord> = Vec::with_capacity(upsert_batch);
	let mut loaded = 0usize;
	for chunk in docs.chunks(opts.embed_batch_size.max(1)) {
		let texts: Vec<String> = chunk.iter().map(|d| d.sentence.clone()).collect();
		let vectors = embedder.embed_batch(&texts).map_err(|e| Error::stage(Stage::Embed, e))?;
		if vectors.len() != chunk.len() {
			return Err(Error::stage(Stage::Embed, format!("embedder returned {} vectors for {} texts", vectors.len(), chunk.len())));
		}
		for (doc, vector) in chunk.iter().zip(vectors) {
			pending.push(VectorRecord { id: doc.id.clone(), vector, text: doc.sentence.clone(), metadata: doc.metadata() });
			if pending.len() >= upsert_batch {
				store.upsert(&pending).map_err(provisioning)?;
				loaded += pending.len();
				pending.clear();
			}
		}
		pb.inc(chunk.len() as u64);
	}
	if !pending.is_empty() {
		store.upsert(&pending).map_err(provisioning)?;
		loaded += pending.len();
	}
	pb.finish_and_clear();
	tracing::info!(loaded, created, "index provisioned");
	Ok(if created { ProvisionOutcome::Created { loaded } } else { ProvisionOutcome::Loaded { loaded } })
}
