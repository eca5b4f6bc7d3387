use std::sync::RwLock;

use lapsearch_core::error::{Error, Result};
use lapsearch_core::traits::{check_dim, CandidateStore};
use lapsearch_core::types::{StoreMatch, StoreStats, VectorRecord};

/// Brute-force cosine store kept in memory. Ties keep insertion order.
pub struct MemoryStore { dim: usize, rows: RwLock<Option<Vec<VectorRecord>>> }

impl MemoryStore {
	pub fn new(dim: usize) -> Self { Self { dim, rows: RwLock::new(None) } }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl CandidateStore for MemoryStore {
	fn dim(&self) -> usize { self.dim }

	fn ensure_index(&self) -> Result<bool> {
		let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
		if rows.is_some() { return Ok(false); }
		*rows = Some(Vec::new());
		Ok(true)
	}

	fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
		for r in records { check_dim(self.dim, r.vector.len())?; }
		let mut guard = self.rows.write().unwrap_or_else(|e| e.into_inner());
		let rows = guard.get_or_insert_with(Vec::new);
		for r in records {
			match rows.iter_mut().find(|row| row.id == r.id) {
				Some(row) => *row = r.clone(),
				None => rows.push(r.clone()),
			}
		}
		Ok(())
	}

	fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoreMatch>> {
		check_dim(self.dim, vector.len())?;
		let guard = self.rows.read().unwrap_or_else(|e| e.into_inner());
		let rows = guard.as_ref().ok_or_else(|| Error::NotFound("vector index".into()))?;
		let mut scored: Vec<(usize, f32)> = rows.iter().enumerate().map(|(i, r)| (i, cosine(vector, &r.vector))).collect();
		scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
		scored.truncate(top_k);
		Ok(scored
			.into_iter()
			.map(|(i, similarity)| StoreMatch { id: rows[i].id.clone(), similarity, text: rows[i].text.clone(), metadata: rows[i].metadata.clone() })
			.collect())
	}

	fn stats(&self) -> Result<StoreStats> {
		let guard = self.rows.read().unwrap_or_else(|e| e.into_inner());
		Ok(StoreStats { count: guard.as_ref().map_or(0, Vec::len) })
	}
}
