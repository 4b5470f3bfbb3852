//! Domain types shared by the retrieval back-ends and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Error;

pub type ChunkId = String;

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Sparse,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Dense => f.write_str("dense"),
            SourceKind::Sparse => f.write_str("sparse"),
        }
    }
}

/// Metadata attached to a back-end match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchMetadata {
    pub text: Option<String>,
    pub document_id: Option<String>,
}

/// The native surface returned by every search back-end, before validation.
///
/// Back-ends report what they found; missing fields stay `None` and are
/// rejected later by [`CandidateRecord::from_match`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    pub id: Option<ChunkId>,
    pub score: f32,
    pub metadata: MatchMetadata,
}

impl SearchMatch {
    pub fn new(id: impl Into<String>, score: f32, text: impl Into<String>, document_id: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            score,
            metadata: MatchMetadata { text: Some(text.into()), document_id },
        }
    }
}

/// One retrieved chunk.
///
/// - `id`: chunk identifier, unique within its source list only
/// - `document_id`: parent document, when the back-end knows it
/// - `score`: back-end specific relevance; never compared across sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub id: ChunkId,
    pub document_id: Option<String>,
    pub text: String,
    pub score: f32,
    pub source: SourceKind,
}

impl CandidateRecord {
    /// Validate a back-end match. An empty or missing `id`, or a missing
    /// `text`, yields [`Error::MalformedCandidate`].
    pub fn from_match(m: SearchMatch, source: SourceKind) -> Result<Self, Error> {
        let id = match m.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(Error::MalformedCandidate(source, "missing id".to_string())),
        };
        let Some(text) = m.metadata.text else {
            return Err(Error::MalformedCandidate(source, format!("missing text for id '{id}'")));
        };
        Ok(Self { id, document_id: m.metadata.document_id, text, score: m.score, source })
    }
}

/// A candidate after reciprocal rank fusion. `fusion_score` drives ranking;
/// `record.score` is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusedCandidate {
    #[serde(flatten)]
    pub record: CandidateRecord,
    pub fusion_score: f64,
}

/// A fused candidate scored by the relevance model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankedCandidate {
    #[serde(flatten)]
    pub fused: FusedCandidate,
    pub rerank_score: f32,
}

impl RerankedCandidate {
    pub fn id(&self) -> &str { &self.fused.record.id }
    pub fn text(&self) -> &str { &self.fused.record.text }
    pub fn document_id(&self) -> Option<&str> { self.fused.record.document_id.as_deref() }
}

/// Full outcome of one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub query_id: String,
    pub query: String,
    pub top_docs: Vec<RerankedCandidate>,
    pub relevant_chunks: String,
    pub final_prompt: String,
    pub answer: String,
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub repetition_penalty: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub do_sample: bool,
}

impl GenerationConfig {
    /// Longer, near-deterministic output for sentence extraction.
    pub fn extraction() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.6,
            top_p: None,
            repetition_penalty: Some(1.15),
            top_k: Some(50),
            do_sample: true,
        }
    }

    /// Short fluent prose for the final answer.
    pub fn answer() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.6,
            top_p: Some(0.9),
            repetition_penalty: Some(1.15),
            top_k: Some(50),
            do_sample: true,
        }
    }
}
