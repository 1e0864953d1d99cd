//! Stage 5 (conditional): company-market fit analysis.

use anyhow::Result;

use crate::agents::disclaimed;
use crate::metering::MeteredGateway;

const PROMPT_TEMPLATE: &str = r#"# Company-Market Fit Analysis
Role: Strategic Company Capability Validator and Gap Analyst.

Task: Conduct a comprehensive assessment of company readiness to execute the recommended IoT positioning strategy, identifying capability gaps and providing actionable development recommendations.

## Assessment Framework

### A. Technology Stack Capability Assessment
For each IoT technology layer, evaluate company readiness using this 1-5 scale:
- 1 (No Capability): Lacks fundamental knowledge/resources in this area
- 2 (Basic): Limited experience, would require significant investment
- 3 (Developing): Some experience, needs targeted capability building
- 4 (Strong): Solid capabilities, minor enhancements needed
- 5 (Excellent): Market-leading capabilities, ready to compete

Technology Layers to Evaluate:
- Device Layer: Hardware design, embedded software, sensor integration, manufacturing
- Connectivity Layer: Network protocols, communication standards, data transmission
- IoT Cloud Layer: Platform architecture, data analytics, application development, scalability
- Cross-cutting Systems: Cybersecurity, system integration, regulatory compliance, data management

### B. Market Variable Fit Assessment
Rate company fit (1-5 scale) for each market variable: market size and growth accessibility, profitability execution capability, regulatory compliance readiness, competitive differentiation strength, digital maturity alignment, customer engagement capability, technological integration readiness.

### C. Strategic Positioning Validation
Evaluate alignment between recommended positioning and company capabilities: strategic fit, ecosystem complexity management, resource requirements, competitive sustainability.

## Output Structure
- Executive Summary: overall strategic fit (Strong/Moderate/Weak), key strengths, critical gaps
- Detailed Capability Assessment: score (1-5), current state, gap analysis, and impact per layer and variable
- Strategic Recommendations: immediate actions (0-6 months), medium-term development (6-18 months), long-term moves (18+ months)
- Risk Assessment: high/medium risk factors with mitigation strategies
- Ultimate Recommendation: Go/No-Go with confidence level, success probability, key success factors

## Important Guidelines
- Do NOT quote or directly reference private company information
- Use general capability categories rather than specific company details
- Focus on actionable insights that support strategic decision-making
- Structure output for executive consumption and strategic planning workshops"#;

/// Assesses company readiness against the recommended positioning. Only
/// runs when a non-empty company capabilities file is present.
pub struct CompanyAgent;

impl CompanyAgent {
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        gateway: &MeteredGateway,
        user_prompt: &str,
        vertical_result: &str,
        geo_result: &str,
        segment_result: &str,
        positioning_result: &str,
        company_capabilities: &str,
    ) -> Result<String> {
        let prompt = format!(
            "{}\nUser Prompt: {}\n\n[IoT Vertical Result]\n{}\n\n[Geo Segmentation Result]\n{}\n\n[Segment Synthesis Result]\n{}\n\n[Positioning Agent Result]\n{}\n\n[Company Capabilities Context]\n{}\n",
            PROMPT_TEMPLATE,
            user_prompt,
            vertical_result,
            geo_result,
            segment_result,
            positioning_result,
            company_capabilities
        );
        let completion = gateway.complete(&prompt).await?;
        Ok(disclaimed(&completion.text))
    }
}
