//! Planner orchestration core.
//!
//! Sequences the agent stages in strict order, threads the accumulating
//! context between them, shapes retrieval queries per stage, and assembles
//! the final report. Stages execute one blocking gateway call at a time;
//! gateway failures propagate and abort the run, while retrieval and export
//! degrade at the edges.
//!
//! Stage order: VERTICAL -> GEO -> SEGMENT -> POSITIONING -> {COMPANY?} ->
//! RANKING -> ASSEMBLED. The company stage runs only when a non-empty
//! company capabilities file exists under the document root; ranking always
//! runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use llm_gateway::LlmGateway;
use serde::{Deserialize, Serialize};

use crate::agents::{
    CompanyAgent, GeoAgent, PositioningAgent, RankingAgent, SegmentAgent, VerticalAgent,
};
use crate::config::{BillingConfig, GeoMode, RunConfig, COMPANY_CAPABILITIES_FILE};
use crate::export;
use crate::metering::{MeteredGateway, UsageLedger};
use crate::retrieval::{ContextProvider, RetrievalIndex};

/// Accumulated stage results for one run.
///
/// Fields fill in pipeline order and are never overwritten. `None` means
/// the stage was skipped (only the company stage can be).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineContext {
    pub vertical_result: Option<String>,
    pub geo_result: Option<String>,
    pub segment_result: Option<String>,
    pub positioning_result: Option<String>,
    pub company_result: Option<String>,
    pub segment_ranking_md: Option<String>,
    pub final_report: Option<String>,
}

/// Sequences the agent pipeline and owns the per-run mutable state
/// (usage ledger, retrieval index).
///
/// Not designed for concurrent `run` invocations; construct a new planner
/// to reset the ledger.
pub struct Planner {
    config: RunConfig,
    gateway: MeteredGateway,
    provider: Option<Box<dyn ContextProvider>>,
}

impl Planner {
    /// Build a planner: zero ledger, metered gateway, best-effort retrieval
    /// index. A missing or empty document root disables retrieval for the
    /// run instead of failing construction.
    pub fn new(gateway: Arc<dyn LlmGateway>, config: RunConfig, billing: BillingConfig) -> Self {
        let provider: Option<Box<dyn ContextProvider>> = if config.retrieval_enabled {
            RetrievalIndex::build(&config.doc_root)
                .map(|index| Box::new(index) as Box<dyn ContextProvider>)
        } else {
            tracing::info!("retrieval disabled by configuration");
            None
        };

        Self {
            config,
            gateway: MeteredGateway::new(gateway, billing),
            provider,
        }
    }

    /// Replace the retrieval provider. Test seam for failure injection.
    pub fn with_context_provider(mut self, provider: Box<dyn ContextProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Snapshot of cumulative token/cost usage.
    pub fn usage(&self) -> UsageLedger {
        self.gateway.ledger()
    }

    /// Execute the full pipeline for one user prompt.
    pub async fn run(&self, user_prompt: &str) -> Result<PipelineContext> {
        let started = Instant::now();
        let geo_mode = GeoMode::resolve(self.config.geo_mode, &self.config.region, user_prompt);
        let company_capabilities = self.load_company_capabilities();

        let mut ctx = PipelineContext::default();

        // Stage 1: vertical analysis. No prior context; the retrieval query
        // derives from the vertical name alone.
        self.stage_banner(1, "IoT Vertical Analysis");
        let rag = self.rag_context(&format!(
            "{} IoT vertical: use cases, technology requirements, market drivers",
            self.config.vertical
        ));
        let vertical_result =
            VerticalAgent::run(&self.gateway, user_prompt, &self.config.vertical, &rag).await?;
        ctx.vertical_result = Some(vertical_result);

        // Stage 2: geo segmentation, branching on geography mode.
        self.stage_banner(2, "Geo Segmentation");
        let rag = match geo_mode {
            GeoMode::Single => self.rag_context(&self.geo_filtered_query(
                "market size, growth, regulation and competition for the target region",
            )),
            GeoMode::Multi => self.rag_context(&self.multi_geo_query()),
        };
        let geo_result = GeoAgent::run(
            &self.gateway,
            geo_mode,
            user_prompt,
            ctx.vertical_result.as_deref().unwrap_or_default(),
            &rag,
            &self.config.region,
            &self.config.vertical,
        )
        .await?;
        ctx.geo_result = Some(geo_result);

        // Stage 3: segment synthesis over both prior results.
        self.stage_banner(3, "Segment Synthesis");
        let rag = self.rag_context(&self.contextual_query(
            "actionable market segments, customer types and use cases",
            user_prompt,
        ));
        let segment_result = SegmentAgent::run(
            &self.gateway,
            user_prompt,
            ctx.vertical_result.as_deref().unwrap_or_default(),
            ctx.geo_result.as_deref().unwrap_or_default(),
            &rag,
        )
        .await?;
        ctx.segment_result = Some(segment_result);

        // Stage 4: strategic positioning. Company capabilities are private
        // context only; the prompt instructs the model not to echo them.
        self.stage_banner(4, "Strategic Positioning");
        let rag = self.rag_context(&self.contextual_query(
            "technology layer positioning and architecture trade-offs",
            user_prompt,
        ));
        let positioning_result = PositioningAgent::run(
            &self.gateway,
            user_prompt,
            ctx.vertical_result.as_deref().unwrap_or_default(),
            ctx.geo_result.as_deref().unwrap_or_default(),
            ctx.segment_result.as_deref().unwrap_or_default(),
            &rag,
            self.config.architecture.as_deref(),
            company_capabilities.as_deref(),
        )
        .await?;
        ctx.positioning_result = Some(positioning_result);

        // Stage 5 (conditional): company fit, gated on the capabilities file.
        match &company_capabilities {
            Some(capabilities) => {
                self.stage_banner(5, "Company Fit Analysis");
                let company_result = CompanyAgent::run(
                    &self.gateway,
                    user_prompt,
                    ctx.vertical_result.as_deref().unwrap_or_default(),
                    ctx.geo_result.as_deref().unwrap_or_default(),
                    ctx.segment_result.as_deref().unwrap_or_default(),
                    ctx.positioning_result.as_deref().unwrap_or_default(),
                    capabilities,
                )
                .await?;
                ctx.company_result = Some(company_result);
            }
            None => {
                println!("\nCompany capabilities not found, skipping company fit stage");
            }
        }

        // Stage 6: segment ranking. Always runs; empty company context when
        // the company stage was skipped.
        self.stage_banner(6, "Segment Ranking");
        let ranking = RankingAgent::run(
            &self.gateway,
            ctx.segment_result.as_deref().unwrap_or_default(),
            ctx.positioning_result.as_deref().unwrap_or_default(),
            company_capabilities.as_deref().unwrap_or_default(),
        )
        .await?;
        ctx.segment_ranking_md = Some(ranking);

        ctx.final_report = Some(self.assemble_report(user_prompt, &ctx));

        let usage = self.gateway.ledger();
        println!(
            "\nRun complete: {} tokens ({} in / {} out), cost {:.4}, elapsed {:.1}s",
            usage.total_tokens(),
            usage.input_tokens,
            usage.output_tokens,
            usage.cost,
            started.elapsed().as_secs_f64()
        );

        Ok(ctx)
    }

    /// Best-effort export of the ranking table to a CSV under the output
    /// directory. Never fails the run.
    pub fn export_segment_ranking(&self, ctx: &PipelineContext) -> Option<PathBuf> {
        let markdown = ctx.segment_ranking_md.as_deref()?;
        export::export_ranking_table(markdown, &self.config.region, &self.config.output_dir)
    }

    /// Retrieval context for one query. Failures never propagate: a broken
    /// provider degrades to an empty context string.
    fn rag_context(&self, query: &str) -> String {
        let Some(provider) = &self.provider else {
            return String::new();
        };
        match provider.query(query) {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(%err, "retrieval query failed, continuing without context");
                String::new()
            }
        }
    }

    /// Query scoped hard to the configured vertical and region, excluding
    /// every other geography.
    fn geo_filtered_query(&self, base: &str) -> String {
        format!(
            "Restrict strictly to the {} vertical in {}. Exclude documents about any other geography. {}",
            self.config.vertical, self.config.region, base
        )
    }

    /// Softer framing query carrying the vertical/region hint plus the raw
    /// user prompt.
    fn contextual_query(&self, base: &str, user_prompt: &str) -> String {
        format!(
            "In the context of the {} vertical ({}): {}. User prompt: {}",
            self.config.vertical, self.config.region, base, user_prompt
        )
    }

    /// Deliberately unscoped query for multi-geography mode: the provider
    /// is asked to surface candidate countries rather than filter to one.
    fn multi_geo_query(&self) -> String {
        format!(
            "Surface and rank candidate countries for the {} vertical. Do not restrict to a single geography; include market size, regulation and competition signals per country.",
            self.config.vertical
        )
    }

    /// Read the company capabilities file under the document root. `None`
    /// when absent or empty; read once per run, never cached across runs.
    fn load_company_capabilities(&self) -> Option<String> {
        let path = self.config.doc_root.join(COMPANY_CAPABILITIES_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            tracing::info!(path = %path.display(), "company capabilities file is empty");
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Concatenate all present results into the delimited report. Company
    /// and ranking sections appear only when non-empty.
    fn assemble_report(&self, user_prompt: &str, ctx: &PipelineContext) -> String {
        let mut report = String::new();
        report.push_str("=== IoT Market Research Report ===\n\n");
        report.push_str(&format!("User Prompt: {}\n\n", user_prompt));

        let sections: [(&str, &Option<String>); 6] = [
            ("IoT Vertical Analysis", &ctx.vertical_result),
            ("Geo Segmentation Analysis", &ctx.geo_result),
            ("Segment Synthesis", &ctx.segment_result),
            ("Strategic Positioning", &ctx.positioning_result),
            ("Company Fit Analysis", &ctx.company_result),
            ("Segment Ranking", &ctx.segment_ranking_md),
        ];
        for (title, result) in sections {
            if let Some(text) = result {
                if !text.trim().is_empty() {
                    report.push_str(&format!("--- {} ---\n{}\n\n", title, text));
                }
            }
        }

        report.push_str("=== End of Report ===");
        report
    }

    fn stage_banner(&self, number: usize, name: &str) {
        println!("\n{}", "=".repeat(80));
        println!("STAGE {}/6: {}", number, name);
        println!("{}", "=".repeat(80));
    }
}
