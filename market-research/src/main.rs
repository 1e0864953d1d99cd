//! Interactive entry point for the market research pipeline.
//!
//! Reads prompts in a loop, runs the planner, and writes three artifacts
//! per run: the plain-text report, a YAML snapshot of the pipeline context,
//! and (best-effort) the segment ranking CSV. A budget breach is the one
//! error translated into a process exit here; everything else propagates as
//! a normal failure.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use llm_gateway::OpenAiGateway;
use market_research::cli::Args;
use market_research::{BudgetExceededError, Planner};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.run_config();
    let billing = args.billing_config();

    let gateway = Arc::new(OpenAiGateway::from_env().context("failed to configure LLM gateway")?);
    println!(
        "Vertical: {} | Region: {} | Model: {} | Ceiling: {:.2}",
        config.vertical,
        config.region,
        gateway.model(),
        billing.cost_ceiling
    );

    list_documents(&config.doc_root);

    let output_dir = config.output_dir.clone();
    let planner = Planner::new(gateway, config, billing);

    if let Some(prompt) = &args.prompt {
        return execute_run(&planner, prompt, &output_dir).await;
    }

    let stdin = std::io::stdin();
    loop {
        print!("\nEnter your user prompt (empty line to exit): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            break;
        }

        execute_run(&planner, prompt, &output_dir).await?;
    }

    println!("Exiting...");
    Ok(())
}

async fn execute_run(
    planner: &Planner,
    prompt: &str,
    output_dir: &std::path::Path,
) -> Result<()> {
    let ctx = match planner.run(prompt).await {
        Ok(ctx) => ctx,
        Err(err) => {
            // The budget circuit breaker is fatal by design; the exit
            // happens here at the boundary, not inside the planner.
            if let Some(budget) = err.downcast_ref::<BudgetExceededError>() {
                eprintln!("FATAL: {}", budget);
                std::process::exit(1);
            }
            return Err(err);
        }
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let report = ctx.final_report.clone().unwrap_or_default();
    let report_path = output_dir.join(format!("report_{}.md", Uuid::new_v4()));
    std::fs::write(&report_path, &report)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    println!("Report written to: {}", report_path.display());

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let context_path = output_dir.join(format!("run_context_{}.yaml", timestamp));
    std::fs::write(&context_path, serde_yaml::to_string(&ctx)?)
        .with_context(|| format!("failed to write {}", context_path.display()))?;
    println!("Run context saved to: {}", context_path.display());

    planner.export_segment_ranking(&ctx);

    Ok(())
}

/// List what the retrieval index will see, mirroring the run header.
fn list_documents(doc_root: &std::path::Path) {
    let Ok(entries) = std::fs::read_dir(doc_root) else {
        println!("No document directory found at: {}", doc_root.display());
        return;
    };
    println!("Available documents under {}:", doc_root.display());
    for entry in entries.flatten() {
        println!(" - {}", entry.file_name().to_string_lossy());
    }
}
