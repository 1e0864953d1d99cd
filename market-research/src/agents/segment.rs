//! Stage 3: market segment synthesis.

use anyhow::Result;

use crate::agents::disclaimed;
use crate::metering::MeteredGateway;

const PROMPT_TEMPLATE: &str = r#"# Segment Synthesis
Role: Strategic Market Segment Analyst.

Task: Combine IoT vertical and geographical analysis to define actionable market segments for IoT vendors.

IoT Technology Stack Context:
When analyzing segments, consider how different technology positioning affects market opportunities:
- Device Layer: Hardware components, sensors, embedded software
- Connectivity Layer: Network communication and data transmission
- IoT Cloud Layer: Platforms, analytics, application development
- Cross-cutting Systems: Security, business integration, external data sources

Instructions:
- Using the provided context, analyze and define a minimum of 5 actionable market segments in the given geography and IoT vertical.
- Ensure segments differ meaningfully in terms of customer types, use cases, technology requirements, or market characteristics.
- For each segment, explicitly evaluate the following variables:

    1. Market size and growth rate: Overall market volume and projected growth within the selected vertical-geography pair
    2. Profitability potential: Expected ROI and margin levels relative to solution scope, pricing model, and buyer willingness to pay
    3. Regulatory requirements and fit: Certification, compliance, and data regulation conditions (e.g., CE, FCC, GDPR, NIS2)
    4. Competitive intensity: Degree of saturation and strength of rival offerings
    5. Digital maturity: Organization readiness of segment to adopt and scale digital IoT systems
    6. Customer consolidation: Centralization of purchasing decisions affecting sales cycle complexity
    7. Technological readiness: Business systems, external information sources, and existing IoT systems integrability

- For each segment, also consider:
    - Which technology layers are most critical for this segment
    - What level of ecosystem complexity customers can handle
    - Whether customers prefer single-layer solutions or integrated offerings

Segment Differentiation Guidelines:
- Create segments based on different customer types (e.g., enterprise vs. SME vs. municipal)
- Consider varying use case complexity (e.g., basic monitoring vs. advanced analytics vs. predictive maintenance)
- Differentiate by technology maturity levels (e.g., early adopters vs. mainstream vs. laggards)
- Account for different regulatory environments or compliance requirements
- Consider varying budget levels and ROI expectations

- Present each segment clearly, structured under these variable headings.
- If any variable lacks sufficient information, state so explicitly.

Remember: The following data is synthetic and generated for illustrative purposes only."#;

/// Synthesizes actionable market segments from the vertical and geo
/// results.
pub struct SegmentAgent;

impl SegmentAgent {
    pub async fn run(
        gateway: &MeteredGateway,
        user_prompt: &str,
        vertical_result: &str,
        geo_result: &str,
        rag_context: &str,
    ) -> Result<String> {
        let prompt = format!(
            "{}\nUser Prompt: {}\n\n[IoT Vertical Result]\n{}\n\n[Geo Segmentation Result]\n{}\n\n[RAG Context]\n{}\n",
            PROMPT_TEMPLATE, user_prompt, vertical_result, geo_result, rag_context
        );
        let completion = gateway.complete(&prompt).await?;
        Ok(disclaimed(&completion.text))
    }
}
