use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{Index, IndexReader, TantivyDocument};

use liverag_core::traits::SparseSearch;
use liverag_core::types::{MatchMetadata, SearchMatch};

use crate::tantivy_utils::{register_tokenizer, DOC_ID_FIELD, ID_FIELD, TEXT_FIELD};

/// BM25 keyword search over an existing tantivy chunk index. Cloning shares
/// the underlying index and reader.
#[derive(Clone)]
pub struct TantivySparseSearch {
	index: Index,
	reader: IndexReader,
	id_field: Field,
	doc_id_field: Field,
	text_field: Field,
}

impl TantivySparseSearch {
	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)
			.map_err(|e| anyhow!("Failed to open tantivy index at {}: {}", index_dir.display(), e))?;
		register_tokenizer(&index);
		let reader = index.reader()?;
		let schema = index.schema();
		let id_field = schema.get_field(ID_FIELD)?;
		let doc_id_field = schema.get_field(DOC_ID_FIELD)?;
		let text_field = schema.get_field(TEXT_FIELD)?;
		tracing::info!(dir = %index_dir.display(), docs = reader.searcher().num_docs(), "opened tantivy index");
		Ok(Self { index, reader, id_field, doc_id_field, text_field })
	}

	fn stored_str(doc: &TantivyDocument, field: Field) -> Option<String> {
		doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string)
	}

	pub fn search_blocking(&self, query_text: &str, limit: usize) -> Result<Vec<SearchMatch>> {
		if limit == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let query_parser = QueryParser::for_index(&self.index, vec![self.text_field]);
		// Natural-language questions contain query-syntax characters; keep whatever parses.
		let (query, errors) = query_parser.parse_query_lenient(query_text);
		if !errors.is_empty() {
			tracing::debug!(errors = errors.len(), "lenient query parse dropped fragments");
		}
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
		let mut matches = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			matches.push(SearchMatch {
				id: Self::stored_str(&doc, self.id_field),
				score,
				metadata: MatchMetadata {
					text: Self::stored_str(&doc, self.text_field),
					document_id: Self::stored_str(&doc, self.doc_id_field),
				},
			});
		}
		Ok(matches)
	}
}

#[async_trait]
impl SparseSearch for TantivySparseSearch {
	async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
		let this = self.clone();
		let query = query.to_string();
		tokio::task::spawn_blocking(move || this.search_blocking(&query, top_k))
			.await
			.map_err(|e| anyhow!("tantivy search task failed: {e}"))?
	}
}
