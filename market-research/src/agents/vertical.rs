//! Stage 1: IoT vertical analysis.

use anyhow::Result;

use crate::agents::disclaimed;
use crate::metering::MeteredGateway;

const PROMPT_TEMPLATE: &str = r#"# IoT Vertical Analysis
Role: Industry Expert in IoT verticals.
Task: Analyze and define the {vertical_name} vertical as an IoT application domain.

Context:
An IoT vertical is an application domain characterized by:
- Similar use cases and business objectives
- Comparable technology requirements (sensors, connectivity, data processing)
- Common industry standards and regulations
- Shared market dynamics and customer types

Instructions:
- Define the vertical as an application domain with clear boundaries
- Identify the core use cases that unite this vertical
- Describe the typical technology stack and requirements
- List main trends and market drivers specific to this domain
- Explain barriers and challenges common across this vertical
- Highlight what differentiates this vertical from other IoT domains
- Mark data as synthetic if based on public summaries."#;

/// Defines the target vertical as an application domain. First stage, no
/// prior context.
pub struct VerticalAgent;

impl VerticalAgent {
    pub async fn run(
        gateway: &MeteredGateway,
        user_prompt: &str,
        vertical_name: &str,
        rag_context: &str,
    ) -> Result<String> {
        let prompt = format!(
            "{}\n\nUser Prompt: {}\n\n[RAG Context]\n{}\n",
            PROMPT_TEMPLATE.replace("{vertical_name}", vertical_name),
            user_prompt,
            rag_context
        );
        let completion = gateway.complete(&prompt).await?;
        Ok(disclaimed(&completion.text))
    }
}
