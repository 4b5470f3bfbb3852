mod cli;
mod context;

use anyhow::{ensure, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;
use tracing_subscriber::EnvFilter;

use liverag_core::config::Config;
use liverag_hybrid::{read_queries, write_outputs, BatchRunner, PipelineOptions, PipelineOrchestrator};

use crate::cli::{AskArgs, BatchArgs, Cli, Commands};
use crate::context::build_context;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_in(&cli.config_dir)?;
    match cli.command {
        Commands::Ask(args) => ask(&config, args).await,
        Commands::Batch(args) => batch(&config, args).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn ask(config: &Config, args: AskArgs) -> Result<()> {
    let settings = config.settings()?;
    let mut options = PipelineOptions::from_settings(&settings);
    if let Some(top_k) = args.top_k {
        options.top_k = top_k;
    }
    if let Some(rrf_k) = args.rrf_k {
        options.rrf_k = rrf_k;
    }
    ensure!(options.top_k > 0 && options.rrf_k > 0, "--top-k and --rrf-k must be positive");

    let ctx = build_context(config, &settings).await?;
    let orchestrator = PipelineOrchestrator::new(ctx, options);
    let result = orchestrator.run(&args.question, args.id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("🔎 {}", result.query);
    println!("\n📄 Top documents:");
    for (i, doc) in result.top_docs.iter().enumerate() {
        let preview: String = doc.text().chars().take(160).collect();
        println!(
            "{:>2}. [{}] {} (doc: {}, rerank {:.4}, rrf {:.4}, {} {:.4})",
            i + 1,
            doc.id(),
            preview,
            doc.document_id().unwrap_or("-"),
            doc.rerank_score,
            doc.fused.fusion_score,
            doc.fused.record.source,
            doc.fused.record.score
        );
    }
    println!("\n🧩 Relevant chunks:\n{}", result.relevant_chunks.trim());
    println!("\n✅ Answer:\n{}", result.answer.trim());
    println!("\n⏱  {:.2}s (query id {})", result.execution_time.as_secs_f64(), result.query_id);
    Ok(())
}

async fn batch(config: &Config, args: BatchArgs) -> Result<()> {
    let settings = config.settings()?;
    let concurrency = args.concurrency.unwrap_or(settings.batch.concurrency);
    ensure!(concurrency > 0, "--concurrency must be positive");

    let file = read_queries(&args.input, args.limit)?;
    println!(
        "Loaded {} queries from {} ({} unreadable)",
        file.queries.len(),
        args.input.display(),
        file.rejected.len()
    );

    let ctx = build_context(config, &settings).await?;
    let orchestrator = PipelineOrchestrator::new(ctx, PipelineOptions::from_settings(&settings));

    let pb = ProgressBar::new(file.queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} queries ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let report = BatchRunner::new(&orchestrator)
        .with_concurrency(concurrency)
        .with_progress(pb)
        .run(file)
        .await;

    write_outputs(&args.output, &report.outputs)?;
    println!("✅ {} answered, {} failed -> {}", report.outputs.len(), report.failures.len(), args.output.display());
    for failure in &report.failures {
        println!("  ✗ {}: {}", failure.id, failure.reason);
    }
    Ok(())
}
