//! Stage 2: geographic segmentation, single-region or multi-country.

use anyhow::Result;

use crate::agents::disclaimed;
use crate::config::GeoMode;
use crate::metering::MeteredGateway;

const SINGLE_TEMPLATE: &str = r#"# Geo Segmentation Analysis
Role: IoT Market Analyst for {region}.
Task: Analyze the IoT market landscape in {region} for {vertical_name}.
Instructions:
- Provide synthetic estimates for market size and growth.
- List regulatory factors, competitor presence, and key challenges.
- Mark data as synthetic."#;

const MULTI_TEMPLATE: &str = r#"# Multi-Geo Segmentation Analysis
Role: IoT Market Geography Analyst

Task: Identify and rank promising geographies for the given IoT vertical, based on available RAG context and general market knowledge.

Instructions:
- You must analyze at least 5 different countries (minimum 5).
- You may analyze up to 7 countries if appropriate.
- Do not include continent-level markets (e.g. 'North America', 'Western Europe') - use only country-level geographies.
- Use both retrieved RAG context AND your own world knowledge.
- You are NOT limited to geographies present in RAG.
- If RAG data is missing for a country, infer based on general IoT trends for the given vertical.
- Prioritize markets that differ in market potential, regulatory complexity, competitive intensity, or strategic relevance.
- Prioritize market diversity.

For each country, provide the following structured output:

### Geography: [Country Name]
- Market Size and Growth: [Qualitative assessment]
- Regulatory Factors: [Summary of relevant factors]
- Competitor Presence: [Summary of key players or competitive intensity]
- Key Challenges: [Top 2-3 challenges]
- Market Potential: [Rating 1-5]
- Summary Recommendation: [Go / Further Analyze / Not Recommended]

Important:
- If RAG data is available for a country, use it.
- If no RAG data is available, rely on your knowledge to provide an estimate.
- Be clear when you are inferring information vs. using retrieved data.
- The Segment Agent will use your output to generate segments per country.

Remember: The following data is synthetic and generated for illustrative purposes only."#;

/// Analyzes the market geography. Consumes the vertical stage's result and
/// branches on geography mode: one scoped region, or a ranked multi-country
/// survey.
pub struct GeoAgent;

impl GeoAgent {
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        gateway: &MeteredGateway,
        mode: GeoMode,
        user_prompt: &str,
        vertical_result: &str,
        rag_context: &str,
        region: &str,
        vertical_name: &str,
    ) -> Result<String> {
        let template = match mode {
            GeoMode::Multi => MULTI_TEMPLATE.to_string(),
            GeoMode::Single => SINGLE_TEMPLATE
                .replace("{region}", region)
                .replace("{vertical_name}", vertical_name),
        };
        let prompt = format!(
            "{}\n\nUser Prompt: {}\n\n[IoT Vertical Result]\n{}\n\n[RAG Context]\n{}\n",
            template, user_prompt, vertical_result, rag_context
        );
        let completion = gateway.complete(&prompt).await?;
        Ok(disclaimed(&completion.text))
    }
}
