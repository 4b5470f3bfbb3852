mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::*;
use liverag_core::error::Error;
use liverag_core::types::{CandidateRecord, FusedCandidate, MatchMetadata, SearchMatch, SourceKind};
use liverag_hybrid::{
    AnswerSynthesizer, HybridSearch, PipelineOptions, PipelineOrchestrator, Reranker, Retriever,
};

fn fused(id: &str, text: &str) -> FusedCandidate {
    FusedCandidate {
        record: CandidateRecord { id: id.into(), document_id: None, text: text.into(), score: 0.0, source: SourceKind::Dense },
        fusion_score: 0.01,
    }
}

fn orchestrator(generator: Arc<ScriptedGenerator>, scorer: Arc<RecordingScorer>) -> PipelineOrchestrator {
    let ctx = context(
        Arc::new(StaticSearch::new(rain_dense())),
        Arc::new(StaticSearch::new(rain_sparse())),
        scorer,
        generator,
    );
    PipelineOrchestrator::new(ctx, PipelineOptions { top_k: 2, rrf_k: 60, ..Default::default() })
}

#[tokio::test]
async fn retriever_normalizes_and_drops_malformed_matches() {
    let mut dense = rain_dense();
    dense.insert(1, SearchMatch { id: None, score: 0.85, metadata: MatchMetadata { text: Some("orphan".into()), document_id: None } });
    dense.push(SearchMatch { id: Some("d9".into()), score: 0.1, metadata: MatchMetadata::default() });
    let dense_search = Arc::new(StaticSearch::new(dense));
    let sparse_search = Arc::new(StaticSearch::new(rain_sparse()));
    let retriever = Retriever::new(dense_search.clone(), sparse_search.clone());

    let (d, s) = retriever.retrieve_hybrid("What causes rain?", 7).await.expect("retrieve");
    assert_eq!(d.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["d1", "d2"]);
    assert_eq!(s.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["d2", "d3"]);
    assert!(d.iter().all(|r| r.source == SourceKind::Dense));
    assert!(s.iter().all(|r| r.source == SourceKind::Sparse));
    assert_eq!(s[0].score, 5.1);
    assert_eq!(dense_search.requested.load(Ordering::SeqCst), 7);
    assert_eq!(sparse_search.requested.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn retrieval_failure_names_the_source() {
    let retriever = Retriever::new(Arc::new(StaticSearch::new(rain_dense())), Arc::new(StaticSearch::failing()));
    let err = retriever.retrieve_hybrid("rain", 5).await.expect_err("must fail");
    match err {
        Error::Retrieval(SourceKind::Sparse, msg) => assert!(msg.contains("connection refused")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn reranker_sorts_stably_and_truncates() {
    let reranker = Reranker::new(Arc::new(FixedScorer(vec![0.2, 0.9, 0.2, 0.5])));
    let candidates = vec![fused("a", "x"), fused("b", "x"), fused("c", "x"), fused("d", "x")];
    let out = reranker.rerank("q", candidates.clone(), 3).await.expect("rerank");
    assert_eq!(out.iter().map(|r| r.id()).collect::<Vec<_>>(), vec!["b", "d", "a"]);
    assert_eq!(out[0].rerank_score, 0.9);

    let all = reranker.rerank("q", candidates, 10).await.expect("rerank");
    assert_eq!(all.iter().map(|r| r.id()).collect::<Vec<_>>(), vec!["b", "d", "a", "c"]);
    for w in all.windows(2) {
        assert!(w[0].rerank_score >= w[1].rerank_score);
    }
}

#[tokio::test]
async fn reranker_rejects_mismatched_scores() {
    let reranker = Reranker::new(Arc::new(FixedScorer(vec![0.3])));
    let err = reranker.rerank("q", vec![fused("a", "x"), fused("b", "y")], 2).await.expect_err("must fail");
    assert!(matches!(err, Error::Reranking(_)));
}

#[tokio::test]
async fn reranker_skips_scoring_empty_input() {
    let scorer = Arc::new(RecordingScorer::default());
    let reranker = Reranker::new(scorer.clone());
    assert!(reranker.rerank("q", Vec::new(), 5).await.expect("rerank").is_empty());
    assert!(scorer.batch_sizes.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn hybrid_search_bounds_reranker_input_by_rrf_k() {
    let dense: Vec<SearchMatch> = (0..30).map(|i| m(&format!("d{i}"), 1.0, "rain text", None)).collect();
    let sparse: Vec<SearchMatch> = (0..30).map(|i| m(&format!("s{i}"), 1.0, "rain words", None)).collect();
    let dense_search = Arc::new(StaticSearch::new(dense));
    let scorer = Arc::new(RecordingScorer::default());
    let search = HybridSearch::new(
        Retriever::new(dense_search.clone(), Arc::new(StaticSearch::new(sparse))),
        Reranker::new(scorer.clone()),
    );

    let top = search.merge_search_with_reranking("rain", 4, 10).await.expect("search");
    assert_eq!(top.len(), 4);
    assert_eq!(dense_search.requested.load(Ordering::SeqCst), 10);
    let sizes = scorer.batch_sizes.lock().expect("lock").clone();
    assert_eq!(sizes, vec![10]);
}

#[tokio::test]
async fn hybrid_search_keeps_source_scores() {
    let search = HybridSearch::new(
        Retriever::new(Arc::new(StaticSearch::new(rain_dense())), Arc::new(StaticSearch::new(rain_sparse()))),
        Reranker::new(Arc::new(RecordingScorer::default())),
    );
    let top = search.merge_search_with_reranking("What causes rain?", 3, 60).await.expect("search");
    assert_eq!(top.iter().map(|r| r.id()).collect::<Vec<_>>(), vec!["d3", "d2", "d1"]);
    assert_eq!(top[0].fused.record.score, 4.0);
    assert_eq!(top[1].fused.record.score, 5.1);
    assert_eq!(top[1].document_id(), Some("doc-2b"));
    assert!((top[1].fused.fusion_score - (1.0 / 60.0 + 1.0 / 61.0)).abs() < 1e-12);
}

#[test]
fn extraction_prompt_delimits_and_flattens_documents() {
    let docs = vec![
        liverag_core::types::RerankedCandidate { fused: fused("a", "  first line\nsecond line  "), rerank_score: 1.0 },
        liverag_core::types::RerankedCandidate { fused: fused("b", "other"), rerank_score: 0.5 },
    ];
    let prompt = AnswerSynthesizer::extraction_prompt("What causes rain?", &docs);
    assert!(prompt.contains("Query: What causes rain?"));
    assert!(prompt.ends_with("\n---\nfirst line second line\n---\nother"));
}

#[test]
fn extraction_prompt_only_flattens_line_feeds() {
    let docs = vec![liverag_core::types::RerankedCandidate { fused: fused("a", "one\r\ntwo\tthree"), rerank_score: 1.0 }];
    let prompt = AnswerSynthesizer::extraction_prompt("q", &docs);
    assert!(prompt.ends_with("\n---\none\r two\tthree"));
}

#[tokio::test]
async fn synthesis_prompt_contains_extraction_and_query() {
    let generator = Arc::new(ScriptedGenerator::default());
    let synth = AnswerSynthesizer::new(generator.clone()).with_token_budget(120);
    let extracted = synth.extract("What causes rain?", &[]).await.expect("extract");
    let synthesis = synth.synthesize("What causes rain?", &extracted).await.expect("synthesize");
    assert!(synthesis.prompt.contains(EXTRACTED));
    assert!(synthesis.prompt.contains("What causes rain?"));
    assert!(synthesis.prompt.contains("within 120 tokens"));
    assert_eq!(synthesis.answer, ANSWER);

    let prompts = generator.prompts.lock().expect("lock").clone();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].1, 1000);
    assert_eq!(prompts[1].1, 256);
}

#[tokio::test]
async fn blank_answer_is_a_generation_error() {
    let generator = Arc::new(ScriptedGenerator { blank_answer: true, ..Default::default() });
    let err = orchestrator(generator, Arc::new(RecordingScorer::default()))
        .run("What causes rain?", Some("q1".into()))
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Generation(_)));
}

#[tokio::test]
async fn run_assembles_pipeline_result() {
    let generator = Arc::new(ScriptedGenerator::default());
    let result = orchestrator(generator.clone(), Arc::new(RecordingScorer::default()))
        .run("What causes rain?", Some("q-42".into()))
        .await
        .expect("run");

    assert_eq!(result.query_id, "q-42");
    assert_eq!(result.query, "What causes rain?");
    assert_eq!(result.top_docs.iter().map(|d| d.id()).collect::<Vec<_>>(), vec!["d3", "d2"]);
    assert_eq!(result.relevant_chunks, format!("  {EXTRACTED}\n"));
    assert_eq!(result.answer, ANSWER);
    assert!(result.final_prompt.contains(EXTRACTED));

    let prompts = generator.prompts.lock().expect("lock").clone();
    assert_eq!(prompts[1].0, result.final_prompt);
    assert!(prompts[0].0.contains("Heavy rain causes floods."));
}

#[tokio::test]
async fn run_without_id_uses_timestamp() {
    let before = chrono::Utc::now().timestamp();
    let result = orchestrator(Arc::new(ScriptedGenerator::default()), Arc::new(RecordingScorer::default()))
        .run("What causes rain?", None)
        .await
        .expect("run");
    let id: i64 = result.query_id.parse().expect("numeric id");
    assert!(id >= before && id <= chrono::Utc::now().timestamp());
}
