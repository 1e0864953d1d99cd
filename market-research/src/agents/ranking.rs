//! Stage 6: segment ranking table.
//!
//! Output is a raw markdown table (no disclaimer prefix) so the spreadsheet
//! exporter can parse it directly.

use anyhow::Result;

use crate::metering::MeteredGateway;

const PROMPT_TEMPLATE: &str = r#"# Segment Ranking Table
This Segment Ranking Agent is part of a multi-agent system for GenAI-driven market segmentation and positioning in IoT markets.

Instructions:
- For each segment (expect minimum 5 segments), output a single unified table (one row per segment) with the following columns:
| Segment Name | Market Potential (1-5) | Justification for Market Potential | Competitive Intensity (1-5) | Justification for Competitive Intensity | Regulatory Complexity (1-5) | Justification for Regulatory Complexity | Technological Readiness (1-5) | Justification for Technological Readiness | Digital Maturity (1-5) | Justification for Digital Maturity | Fit with Company Capabilities (1-5) | Justification for Fit with Company Capabilities | Ultimate Recommendation |
- Fill in all columns for each segment, using the Segment Agent, Positioning Agent, and Company Capabilities context.
- Output the table in markdown format, with column headers and one row per segment.
- Rank segments by overall attractiveness, with the most promising segments listed first.
- The same table will be exported to a spreadsheet for management decision workshops.
- Be concise and actionable. Structure your output clearly.

Remember: The following data is synthetic and generated for illustrative purposes only."#;

/// Produces the ranked per-segment markdown table. Always runs, with an
/// empty company context when the company stage was skipped.
pub struct RankingAgent;

impl RankingAgent {
    pub async fn run(
        gateway: &MeteredGateway,
        segment_result: &str,
        positioning_result: &str,
        company_capabilities: &str,
    ) -> Result<String> {
        let prompt = format!(
            "{}\n[Segment Synthesis Result]\n{}\n\n[Positioning Agent Result]\n{}\n\n[Company Capabilities Context]\n{}\n",
            PROMPT_TEMPLATE, segment_result, positioning_result, company_capabilities
        );
        let completion = gateway.complete(&prompt).await?;
        Ok(completion.text.trim().to_string())
    }
}
