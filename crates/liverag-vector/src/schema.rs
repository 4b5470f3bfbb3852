use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const DOC_ID_COLUMN: &str = "doc_id";
pub const TEXT_COLUMN: &str = "text";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

/// Arrow layout of a chunk table with `dim`-wide embeddings.
pub fn chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COLUMN, DataType::Utf8, true),
		Field::new(DOC_ID_COLUMN, DataType::Utf8, true),
		Field::new(TEXT_COLUMN, DataType::Utf8, true),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
