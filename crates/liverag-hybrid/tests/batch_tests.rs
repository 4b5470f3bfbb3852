mod common;

use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

use common::*;
use liverag_hybrid::{read_queries, write_outputs, BatchQuery, BatchRunner, PipelineOptions, PipelineOrchestrator};

fn queries() -> Vec<BatchQuery> {
    vec![
        BatchQuery { id: json!(1), question: "What causes rain?".into() },
        BatchQuery { id: json!("q2"), question: "Why do clouds form?".into() },
        BatchQuery { id: json!(3), question: "When does it flood?".into() },
        BatchQuery { id: json!("q4"), question: "Is rain water?".into() },
        BatchQuery { id: json!(5), question: "What are droplets?".into() },
    ]
}

fn orchestrator(scorer: RecordingScorer) -> PipelineOrchestrator {
    let ctx = context(
        Arc::new(StaticSearch::new(rain_dense())),
        Arc::new(StaticSearch::new(rain_sparse())),
        Arc::new(scorer),
        Arc::new(ScriptedGenerator::default()),
    );
    PipelineOrchestrator::new(ctx, PipelineOptions { top_k: 3, rrf_k: 60, ..Default::default() })
}

#[tokio::test]
async fn one_failing_query_does_not_stop_the_batch() {
    let scorer = RecordingScorer { short_for: Some("When does it flood?".into()), ..Default::default() };
    let orchestrator = orchestrator(scorer);
    let report = BatchRunner::new(&orchestrator).with_concurrency(2).run(queries()).await;

    assert_eq!(report.outputs.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, json!(3));
    assert!(report.failures[0].reason.contains("Reranking"));
    let ids: Vec<Value> = report.outputs.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![json!(1), json!("q2"), json!("q4"), json!(5)]);
}

#[tokio::test]
async fn outputs_carry_passages_with_document_ids() {
    let orchestrator = orchestrator(RecordingScorer::default());
    let report = BatchRunner::new(&orchestrator).run(queries()[..1].to_vec()).await;
    let out = &report.outputs[0];
    assert_eq!(out.question, "What causes rain?");
    assert_eq!(out.answer, ANSWER);
    assert_eq!(out.passages.len(), 3);
    assert_eq!(out.passages[0].passage, "Heavy rain causes floods.");
    assert_eq!(out.passages[0].doc_ids, vec![None]);
    assert_eq!(out.passages[1].doc_ids, vec![Some("doc-2b".to_string())]);

    let line = serde_json::to_value(out).expect("json");
    assert_eq!(line["id"], json!(1));
    assert_eq!(line["passages"][0]["doc_IDs"], json!([null]));
    assert_eq!(line["passages"][1]["doc_IDs"], json!(["doc-2b"]));
    assert!(line["final_prompt"].as_str().expect("prompt").contains("What causes rain?"));
}

#[tokio::test]
async fn jsonl_round_trip_through_files() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("in.jsonl");
    let output = tmp.path().join("out.jsonl");
    let mut f = std::fs::File::create(&input).expect("create");
    writeln!(f, "{}", json!({ "id": 7, "question": "What causes rain?" })).expect("write");
    writeln!(f).expect("write");
    writeln!(f, "{}", json!({ "id": "abc", "question": "Is rain water?" })).expect("write");
    writeln!(f, "{}", json!({ "id": 9, "question": "Skipped by limit" })).expect("write");
    drop(f);

    let qs = read_queries(&input, Some(2)).expect("read");
    assert_eq!(qs.queries.len(), 2);
    assert!(qs.rejected.is_empty());
    assert_eq!(qs.queries[1].query_id(), "abc");
    assert_eq!(qs.queries[0].query_id(), "7");

    let orchestrator = orchestrator(RecordingScorer::default());
    let report = BatchRunner::new(&orchestrator).run(qs).await;
    write_outputs(&output, &report.outputs).expect("write outputs");

    let text = std::fs::read_to_string(&output).expect("read output");
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).expect("line json")).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], json!(7));
    assert_eq!(lines[1]["id"], json!("abc"));
}

#[tokio::test]
async fn malformed_record_is_reported_and_the_rest_still_run() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("mixed.jsonl");
    let lines = [
        json!({ "id": 1, "question": "What causes rain?" }).to_string(),
        json!({ "id": 2, "question": "Why do clouds form?" }).to_string(),
        json!({ "id": 3 }).to_string(),
        json!({ "id": 4, "question": "Is rain water?" }).to_string(),
        "not json at all".to_string(),
        json!({ "id": 6, "question": "What are droplets?" }).to_string(),
    ];
    std::fs::write(&input, lines.join("\n")).expect("write");

    let file = read_queries(&input, None).expect("read");
    assert_eq!(file.queries.len(), 4);
    assert_eq!(file.rejected.len(), 2);
    assert_eq!(file.rejected[0].id, json!(3));
    assert!(file.rejected[0].reason.contains("question"));
    assert_eq!(file.rejected[1].id, json!(5));

    let orchestrator = orchestrator(RecordingScorer::default());
    let report = BatchRunner::new(&orchestrator).run(file).await;
    let ids: Vec<Value> = report.outputs.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(4), json!(6)]);
    let failed: Vec<Value> = report.failures.iter().map(|f| f.id.clone()).collect();
    assert_eq!(failed, vec![json!(3), json!(5)]);
}

#[test]
fn limit_counts_rejected_records() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("limited.jsonl");
    std::fs::write(&input, "{\"id\": 1}\n{\"id\": 2, \"question\": \"q\"}\n{\"id\": 3, \"question\": \"q\"}\n").expect("write");
    let file = read_queries(&input, Some(2)).expect("read");
    assert_eq!(file.rejected.len(), 1);
    assert_eq!(file.queries.len(), 1);
}

#[test]
fn missing_input_file_is_an_error() {
    let tmp = TempDir::new().expect("tmp");
    assert!(read_queries(&tmp.path().join("missing.jsonl"), None).is_err());
}
