use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use liverag_core::traits::{DenseSearch, Embedder};
use liverag_core::types::{MatchMetadata, SearchMatch};

use crate::schema::{DISTANCE_COLUMN, DOC_ID_COLUMN, ID_COLUMN, TEXT_COLUMN};

/// Nearest-neighbour search over an existing LanceDB chunk table.
pub struct LanceDenseSearch { db: Connection, table_name: String, embedder: Arc<dyn Embedder> }

impl LanceDenseSearch {
	pub async fn open(db_path: &Path, table_name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		if !db.table_names().execute().await?.iter().any(|t| t == table_name) {
			return Err(anyhow!("LanceDB table '{}' not found in {}", table_name, db_path.display()));
		}
		tracing::info!(db = %db_path.display(), table = table_name, "opened LanceDB table");
		Ok(Self { db, table_name: table_name.to_string(), embedder: Arc::from(embedder) })
	}
}

/// Runs the (model-bound) query embedding on the blocking pool.
pub(crate) async fn embed_query(embedder: &Arc<dyn Embedder>, query: &str) -> Result<Vec<f32>> {
	let embedder = Arc::clone(embedder);
	let query = query.to_string();
	tokio::task::spawn_blocking(move || embedder.embed_batch(&[query]))
		.await
		.map_err(|e| anyhow!("query embedding task failed: {e}"))??
		.into_iter()
		.next()
		.ok_or_else(|| anyhow!("embedder returned no vector for the query"))
}

fn string_at(batch: &RecordBatch, column: &str, row: usize) -> Option<String> {
	let col = batch.column_by_name(column)?.as_any().downcast_ref::<StringArray>()?;
	if col.is_null(row) { None } else { Some(col.value(row).to_string()) }
}

/// Lance reports a distance; flip it so higher is better like every other back-end.
fn score_at(batch: &RecordBatch, row: usize) -> f32 {
	batch
		.column_by_name(DISTANCE_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.map(|d| 1.0 - d.value(row))
		.unwrap_or(0.0)
}

/// Rows of a result batch, in the order Lance returned them.
pub fn batch_to_matches(batch: &RecordBatch) -> Vec<SearchMatch> {
	(0..batch.num_rows())
		.map(|i| SearchMatch {
			id: string_at(batch, ID_COLUMN, i),
			score: score_at(batch, i),
			metadata: MatchMetadata { text: string_at(batch, TEXT_COLUMN, i), document_id: string_at(batch, DOC_ID_COLUMN, i) },
		})
		.collect()
}

#[async_trait]
impl DenseSearch for LanceDenseSearch {
	async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
		if top_k == 0 { return Ok(Vec::new()); }
		let query_vec = embed_query(&self.embedder, query).await?;
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(query_vec)?.limit(top_k).execute().await?;
		let mut matches = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			matches.extend(batch_to_matches(&batch));
		}
		matches.truncate(top_k);
		Ok(matches)
	}
}
