//! End-to-end pipeline tests against a scripted gateway.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use llm_gateway::{Completion, GatewayError, LlmGateway, TokenUsage};
use market_research::{
    BillingConfig, BudgetExceededError, ContextProvider, GeoMode, PipelineContext, Planner,
    RunConfig,
};

const RANKING_TABLE: &str = r#"| Segment Name | Market Potential (1-5) | Ultimate Recommendation |
|---|---|---|
| Municipal water monitoring | 4 | Go |
| Precision irrigation SMEs | 5 | Go |
| Greenhouse climate control | 4 | Go |
| Livestock tracking | 3 | Further Analyze |
| Soil analytics platforms | 2 | Not Recommended |"#;

/// Gateway that answers each stage from its template header and records
/// every prompt it sees.
struct MockGateway {
    usage: Option<TokenUsage>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockGateway {
    fn new(usage: Option<TokenUsage>) -> Arc<Self> {
        Arc::new(Self {
            usage,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn complete(&self, prompt: &str) -> Result<Completion, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());

        let text = if prompt.starts_with("# Segment Ranking Table") {
            RANKING_TABLE.to_string()
        } else {
            format!("Synthetic stage output for call {}", call)
        };
        Ok(Completion {
            text,
            usage: self.usage,
        })
    }
}

fn usage(prompt_tokens: u64, completion_tokens: u64) -> TokenUsage {
    TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}

fn run_config(doc_root: &Path, output_dir: &Path) -> RunConfig {
    RunConfig {
        vertical: "Agriculture".to_string(),
        region: "Finland".to_string(),
        architecture: Some("Edge-Cloud Hybrid".to_string()),
        geo_mode: GeoMode::Single,
        doc_root: doc_root.to_path_buf(),
        retrieval_enabled: true,
        output_dir: output_dir.to_path_buf(),
    }
}

fn billing(ceiling: f64) -> BillingConfig {
    BillingConfig {
        input_rate_per_mtok: 30.0,
        output_rate_per_mtok: 60.0,
        cost_ceiling: ceiling,
    }
}

fn section_headers(report: &str) -> Vec<&str> {
    report
        .lines()
        .filter(|line| line.starts_with("--- "))
        .collect()
}

#[tokio::test]
async fn empty_rag_single_geo_run_completes_without_company() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    let ctx = planner
        .run("Smart irrigation systems for precision agriculture")
        .await
        .unwrap();

    assert!(ctx.vertical_result.as_deref().is_some_and(|s| !s.is_empty()));
    assert!(ctx.geo_result.as_deref().is_some_and(|s| !s.is_empty()));
    assert!(ctx.segment_result.as_deref().is_some_and(|s| !s.is_empty()));
    assert!(ctx
        .positioning_result
        .as_deref()
        .is_some_and(|s| !s.is_empty()));
    assert!(ctx
        .segment_ranking_md
        .as_deref()
        .is_some_and(|s| !s.is_empty()));

    // No company file: stage skipped, gateway never called for it.
    assert!(ctx.company_result.is_none());
    assert_eq!(gateway.calls(), 5);

    let report = ctx.final_report.as_deref().unwrap();
    let headers = section_headers(report);
    assert_eq!(
        headers,
        vec![
            "--- IoT Vertical Analysis ---",
            "--- Geo Segmentation Analysis ---",
            "--- Segment Synthesis ---",
            "--- Strategic Positioning ---",
            "--- Segment Ranking ---",
        ]
    );
    assert!(!report.contains("Company Fit Analysis"));
    assert!(report.starts_with("=== IoT Market Research Report ==="));
    assert!(report.ends_with("=== End of Report ==="));
}

#[tokio::test]
async fn company_capabilities_file_enables_company_stage() {
    let docs = tempfile::tempdir().unwrap();
    std::fs::write(
        docs.path().join("company_capabilities.txt"),
        "Strong embedded firmware team, no cloud platform experience.",
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    let ctx = planner.run("Smart irrigation systems").await.unwrap();

    assert!(ctx.company_result.as_deref().is_some_and(|s| !s.is_empty()));
    assert_eq!(gateway.calls(), 6);

    let report = ctx.final_report.as_deref().unwrap();
    assert!(report.contains("--- Company Fit Analysis ---"));

    // Ranking prompt receives the capabilities text even though the
    // company stage already ran.
    let prompts = gateway.prompts();
    let ranking_prompt = prompts.last().unwrap();
    assert!(ranking_prompt.starts_with("# Segment Ranking Table"));
    assert!(ranking_prompt.contains("Strong embedded firmware team"));
}

#[tokio::test]
async fn empty_company_file_is_treated_as_absent() {
    let docs = tempfile::tempdir().unwrap();
    std::fs::write(docs.path().join("company_capabilities.txt"), "  \n").unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    let ctx = planner.run("Smart irrigation systems").await.unwrap();

    assert!(ctx.company_result.is_none());
    assert_eq!(gateway.calls(), 5);
}

#[tokio::test]
async fn ranking_export_row_count_matches_table() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    let ctx = planner.run("Smart irrigation systems").await.unwrap();
    let path = planner.export_segment_ranking(&ctx).unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let data_rows = csv.lines().count() - 1;
    let md_rows = ctx
        .segment_ranking_md
        .as_deref()
        .unwrap()
        .lines()
        .filter(|l| l.trim_start().starts_with('|'))
        .count()
        - 2; // header and separator
    assert_eq!(data_rows, md_rows);
    assert_eq!(data_rows, 5);
}

#[tokio::test]
async fn export_skipped_when_ranking_has_no_table() {
    let out = tempfile::tempdir().unwrap();
    let docs = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(None);
    let planner = Planner::new(
        gateway,
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    let ctx = PipelineContext {
        segment_ranking_md: Some("no pipes in this output".to_string()),
        ..Default::default()
    };
    assert!(planner.export_segment_ranking(&ctx).is_none());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn cost_accounting_is_additive_across_stages() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(2_000, 1_000)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    );

    planner.run("Smart irrigation systems").await.unwrap();

    let ledger = planner.usage();
    assert_eq!(ledger.calls, 5);
    assert_eq!(ledger.input_tokens, 10_000);
    assert_eq!(ledger.output_tokens, 5_000);
    let expected = 5.0 * ((2_000.0 / 1e6) * 30.0 + (1_000.0 / 1e6) * 60.0);
    assert!((ledger.cost - expected).abs() < 1e-12);
}

#[tokio::test]
async fn budget_breach_aborts_run_after_first_call() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // One call costs 30.0; the ceiling is 1.0.
    let gateway = MockGateway::new(Some(usage(1_000_000, 0)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(1.0),
    );

    let err = planner.run("Smart irrigation systems").await.unwrap_err();
    assert!(err.downcast_ref::<BudgetExceededError>().is_some());

    // The breach is detected after the first call lands; no further stage
    // call is issued.
    assert_eq!(gateway.calls(), 1);
}

struct FailingProvider;

impl ContextProvider for FailingProvider {
    fn query(&self, _query: &str) -> anyhow::Result<String> {
        anyhow::bail!("index backend unavailable")
    }
}

#[tokio::test]
async fn retrieval_failure_degrades_to_empty_context() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    )
    .with_context_provider(Box::new(FailingProvider));

    let ctx = planner.run("Smart irrigation systems").await.unwrap();

    assert!(ctx.final_report.is_some());
    assert_eq!(gateway.calls(), 5);
    // Every stage prompt carries an empty RAG section rather than an error.
    for prompt in gateway.prompts() {
        assert!(!prompt.contains("index backend unavailable"));
    }
}

/// Provider that records the queries it is asked.
struct RecordingProvider {
    queries: Arc<Mutex<Vec<String>>>,
}

impl ContextProvider for RecordingProvider {
    fn query(&self, query: &str) -> anyhow::Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(String::new())
    }
}

#[tokio::test]
async fn comparison_prompt_switches_to_multi_geo_variant() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    )
    .with_context_provider(Box::new(RecordingProvider {
        queries: queries.clone(),
    }));

    planner
        .run("Compare smart farming adoption across geographies")
        .await
        .unwrap();

    // The geo stage used the multi-country template, not the single-region
    // one.
    let prompts = gateway.prompts();
    assert!(prompts[1].starts_with("# Multi-Geo Segmentation Analysis"));

    // And the retrieval query for that stage is the unscoped variant.
    let queries = queries.lock().unwrap();
    let geo_query = &queries[1];
    assert!(geo_query.contains("Surface and rank candidate countries"));
    assert!(!geo_query.contains("Exclude documents about any other geography"));
}

#[tokio::test]
async fn single_region_uses_geo_filtered_query() {
    let docs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Some(usage(1_000, 500)));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let planner = Planner::new(
        gateway.clone(),
        run_config(docs.path(), out.path()),
        billing(100.0),
    )
    .with_context_provider(Box::new(RecordingProvider {
        queries: queries.clone(),
    }));

    planner.run("Smart irrigation systems").await.unwrap();

    let prompts = gateway.prompts();
    assert!(prompts[1].starts_with("# Geo Segmentation Analysis"));

    let queries = queries.lock().unwrap();
    assert!(queries[1].contains("Exclude documents about any other geography"));
    assert!(queries[1].contains("Agriculture"));
    assert!(queries[1].contains("Finland"));
}
