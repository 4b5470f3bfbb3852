//! JSONL batch evaluation: `{id, question}` in, `{id, question, passages,
//! final_prompt, answer}` out.
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use liverag_core::error::Result;
use liverag_core::types::PipelineResult;

use crate::pipeline::PipelineOrchestrator;

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchQuery {
    /// Written back exactly as read (string or number).
    pub id: Value,
    pub question: String,
}

impl BatchQuery {
    pub fn query_id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    pub passage: String,
    #[serde(rename = "doc_IDs")]
    pub doc_ids: Vec<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutput {
    pub id: Value,
    pub question: String,
    pub passages: Vec<Passage>,
    pub final_prompt: String,
    pub answer: String,
}

impl BatchOutput {
    pub fn from_result(id: Value, result: PipelineResult) -> Self {
        let passages = result
            .top_docs
            .iter()
            .map(|doc| Passage { passage: doc.text().to_string(), doc_ids: vec![doc.document_id().map(str::to_string)] })
            .collect();
        Self { id, question: result.query, passages, final_prompt: result.final_prompt, answer: result.answer }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub id: Value,
    pub reason: String,
}

/// Queries parsed from a JSONL file, plus the records that could not be read.
#[derive(Debug, Default)]
pub struct QueryFile {
    pub queries: Vec<BatchQuery>,
    pub rejected: Vec<BatchFailure>,
}

impl From<Vec<BatchQuery>> for QueryFile {
    fn from(queries: Vec<BatchQuery>) -> Self {
        Self { queries, rejected: Vec::new() }
    }
}

/// Successful outputs in input order, plus the queries that failed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<BatchOutput>,
    pub failures: Vec<BatchFailure>,
}

pub struct BatchRunner<'a> {
    orchestrator: &'a PipelineOrchestrator,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(orchestrator: &'a PipelineOrchestrator) -> Self {
        Self { orchestrator, concurrency: DEFAULT_CONCURRENCY, progress: None }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs every query with at most `concurrency` in flight. A failing query
    /// is logged and reported; it never stops the others.
    pub async fn run(&self, input: impl Into<QueryFile>) -> BatchReport {
        let QueryFile { queries, rejected } = input.into();
        let orchestrator = self.orchestrator;
        let progress = self.progress.as_ref();
        let results: Vec<(BatchQuery, Result<PipelineResult>)> = stream::iter(queries)
            .map(move |q| async move {
                let result = orchestrator.run(&q.question, Some(q.query_id())).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                (q, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport { outputs: Vec::new(), failures: rejected };
        for (q, result) in results {
            match result {
                Ok(result) => report.outputs.push(BatchOutput::from_result(q.id, result)),
                Err(e) => {
                    tracing::error!(query_id = %q.query_id(), error = %e, "query failed");
                    report.failures.push(BatchFailure { id: q.id, reason: e.to_string() });
                }
            }
        }
        if let Some(pb) = progress {
            pb.finish_with_message(format!("{} ok, {} failed", report.outputs.len(), report.failures.len()));
        }
        report
    }
}

/// Read `{id, question}` records, skipping blank lines. A record that does
/// not parse is rejected on its own, identified by its `id` when it has one
/// and by its line number otherwise. `limit` counts records, rejected or not.
pub fn read_queries(path: &Path, limit: Option<usize>) -> Result<QueryFile> {
    let reader = BufReader::new(File::open(path)?);
    let mut file = QueryFile::default();
    for (lineno, line) in reader.lines().enumerate() {
        if limit.is_some_and(|n| file.queries.len() + file.rejected.len() >= n) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<BatchQuery>(&line) {
            Ok(query) => file.queries.push(query),
            Err(e) => {
                let id = serde_json::from_str::<Value>(&line)
                    .ok()
                    .and_then(|v| v.get("id").cloned())
                    .unwrap_or_else(|| Value::from(lineno + 1));
                tracing::error!(path = %path.display(), line = lineno + 1, %id, error = %e, "invalid query record");
                file.rejected.push(BatchFailure { id, reason: format!("line {}: {e}", lineno + 1) });
            }
        }
    }
    Ok(file)
}

pub fn write_outputs(path: &Path, outputs: &[BatchOutput]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for output in outputs {
        serde_json::to_writer(&mut writer, output)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
