use anyhow::{anyhow, Result as AnyResult};
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tokio::runtime::Runtime;

use lapsearch_core::error::{Error, Result, Stage};
use lapsearch_core::traits::{check_dim, CandidateStore};
use lapsearch_core::types::{Meta, StoreMatch, StoreStats, VectorRecord};

use crate::schema::{build_store_schema, vector_dim, VECTOR_COLUMN};
use crate::table::{ensure_table, open_db, table_exists};

/// LanceDB-backed candidate store with cosine distance.
///
/// The async client is driven from an owned runtime so the store can sit
/// behind the synchronous [`CandidateStore`] trait. Do not call it from inside
/// another tokio runtime.
pub struct LanceStore { rt: Runtime, db: Connection, table_name: String, dim: usize }

fn store_err(e: anyhow::Error) -> Error { Error::stage(Stage::Store, e) }

impl LanceStore {
	pub fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
		let rt = Runtime::new().map_err(|e| Error::stage(Stage::Store, e))?;
		let db = rt.block_on(open_db(uri)).map_err(store_err)?;
		tracing::debug!(uri, table = table_name, dim, "opened lancedb");
		Ok(Self { rt, db, table_name: table_name.to_string(), dim })
	}

	async fn existing_dim(&self) -> AnyResult<Option<usize>> {
		if !table_exists(&self.db, &self.table_name).await? { return Ok(None); }
		let table = self.db.open_table(&self.table_name).execute().await?;
		let schema = table.schema().await?;
		vector_dim(&schema).map(Some).ok_or_else(|| anyhow!("table '{}' has no '{}' column", self.table_name, VECTOR_COLUMN))
	}

	fn to_record_batch(&self, records: &[VectorRecord]) -> AnyResult<RecordBatch> {
		let schema = build_store_schema(self.dim);
		let mut ids = Vec::with_capacity(records.len()); let mut texts = Vec::with_capacity(records.len()); let mut metas = Vec::with_capacity(records.len());
		let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
		for r in records { ids.push(r.id.as_str()); texts.push(r.text.as_str()); metas.push(serde_json::to_string(&r.metadata)?); vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect())); }
		Ok(RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(texts)),
			Arc::new(StringArray::from(metas)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), self.dim as i32)),
		])?)
	}

	async fn upsert_async(&self, records: &[VectorRecord]) -> AnyResult<()> {
		ensure_table(&self.db, &self.table_name, build_store_schema(self.dim)).await?;
		let batch = self.to_record_batch(records)?; let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let table = self.db.open_table(&self.table_name).execute().await?;
		// Upsert behavior via merge_insert: id is unique
		let mut mi = table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await?;
		Ok(())
	}

	async fn query_async(&self, vector: &[f32], top_k: usize) -> AnyResult<Vec<StoreMatch>> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(vector.to_vec())?.distance_type(DistanceType::Cosine).limit(top_k).execute().await?;
		let mut matches = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = string_col(&batch, "id")?; let texts = string_col(&batch, "text")?; let metas = string_col(&batch, "metadata")?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>()).ok_or_else(|| anyhow!("_distance column missing"))?;
			for i in 0..batch.num_rows() {
				let metadata: Meta = serde_json::from_str(metas.value(i))?;
				matches.push(StoreMatch { id: ids.value(i).to_string(), similarity: 1.0 - distances.value(i), text: texts.value(i).to_string(), metadata });
			}
		}
		matches.truncate(top_k);
		Ok(matches)
	}

	async fn count_async(&self) -> AnyResult<usize> {
		if !table_exists(&self.db, &self.table_name).await? { return Ok(0); }
		Ok(self.db.open_table(&self.table_name).execute().await?.count_rows(None).await?)
	}
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> AnyResult<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("{name} column missing"))
}

impl CandidateStore for LanceStore {
	fn dim(&self) -> usize { self.dim }

	fn ensure_index(&self) -> Result<bool> {
		if let Some(existing) = self.rt.block_on(self.existing_dim()).map_err(store_err)? {
			check_dim(existing, self.dim)?;
			return Ok(false);
		}
		let created = self.rt.block_on(ensure_table(&self.db, &self.table_name, build_store_schema(self.dim))).map_err(store_err)?;
		if created { tracing::info!(table = %self.table_name, dim = self.dim, "created vector index"); }
		Ok(created)
	}

	fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
		for r in records { check_dim(self.dim, r.vector.len())?; }
		if records.is_empty() { return Ok(()); }
		self.rt.block_on(self.upsert_async(records)).map_err(store_err)?;
		tracing::debug!(rows = records.len(), "upserted vectors");
		Ok(())
	}

	fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoreMatch>> {
		check_dim(self.dim, vector.len())?;
		if top_k == 0 { return Ok(Vec::new()); }
		if !self.rt.block_on(table_exists(&self.db, &self.table_name)).map_err(store_err)? {
			return Err(Error::NotFound(format!("vector index '{}'", self.table_name)));
		}
		self.rt.block_on(self.query_async(vector, top_k)).map_err(store_err)
	}

	fn stats(&self) -> Result<StoreStats> {
		let count = self.rt.block_on(self.count_async()).map_err(store_err)?;
		Ok(StoreStats { count })
	}
}
