//! Stage 4: strategic positioning recommendation.

use anyhow::Result;

use crate::agents::disclaimed;
use crate::metering::MeteredGateway;

const PROMPT_TEMPLATE: &str = r#"# Strategic Positioning
Role: IoT Strategic Positioning Advisor.

Task: Recommend the most appropriate IoT system architecture positioning layer for the vendor, based strictly on the provided segment analysis and market variable scores.

IoT System Architecture Framework:
This layered architecture illustrates technological positioning options for IoT vendors:

1. Device Layer ("Thing"):
   - Thing hardware: Core physical components (sensors, boards)
   - IoT components: Embedded processors, sensors, communication ports
   - Thing software: Embedded software managing device functionality

2. Connectivity Layer:
   - Network communication: Communication protocols for data transmission

3. IoT Cloud Layer:
   - Thing communication and management: Software managing connected devices
   - Application platform: Development environments for IoT applications
   - Analytics and data management: Processing time-series and sensor data
   - Process management and IoT applications: Task execution and coordination

Cross-cutting Systems (spanning all layers):
   - Identity and security: Access control and secure operations
   - Integration with business systems: Connection to ERP, CRM, PLM systems
   - External information sources: Third-party data provider connections

Instructions:
1. Evaluate each market variable from the Segment Agent output (market size and growth, profitability potential, regulatory fit, competitive intensity, digital maturity, customer consolidation, technological readiness).
2. Based strictly on the Segment Agent output and market variable scores, recommend one of the following positioning strategies:
    - Device Layer: Focus on hardware components, sensors, or embedded software
    - Connectivity Layer: Focus on network communication and data transmission
    - IoT Cloud Layer: Focus on cloud platforms, analytics, or application development
    - Multi-layer (end-to-end): Full-stack positioning across multiple layers
    - Cross-cutting Systems: Focus on security, integration, or external data services
3. Consider how ecosystem complexity and integration needs vary by positioning:
    - Device Layer: Lower ecosystem complexity, focused partnerships
    - Cloud Layer: Higher ecosystem complexity, extensive integration needs
    - Multi-layer: Highest complexity, comprehensive ecosystem management
4. Justify your recommendation using only the market variable scores and explanations.
5. Do NOT recommend sales actions, partnerships, or general go-to-market advice.
6. Keep your output clean, technical, and focused on architecture positioning.
7. Begin your output with the disclaimer:
"The following data is synthetic and generated for illustrative purposes only."

Remember: This report is public. Do not disclose or reference the private company input directly."#;

/// Recommends an architecture positioning layer. Receives the company
/// capability text as private context that must not be echoed in the
/// output; that confidentiality is a prompt instruction, not a mechanical
/// guarantee.
pub struct PositioningAgent;

impl PositioningAgent {
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        gateway: &MeteredGateway,
        user_prompt: &str,
        vertical_result: &str,
        geo_result: &str,
        segment_result: &str,
        rag_context: &str,
        architecture: Option<&str>,
        company_capabilities: Option<&str>,
    ) -> Result<String> {
        let mut prompt = format!(
            "{}\nUser Prompt: {}\n\n[IoT Vertical Result]\n{}\n\n[Geo Segmentation Result]\n{}\n\n[Segment Synthesis Result]\n{}\n\n[RAG Context]\n{}\n",
            PROMPT_TEMPLATE, user_prompt, vertical_result, geo_result, segment_result, rag_context
        );
        if let Some(capabilities) = company_capabilities {
            prompt.push_str(&format!(
                "\n[Private Company Capabilities] (for LLM context only, do not include in output):\n{}\n",
                capabilities
            ));
        }
        if let Some(architecture) = architecture {
            prompt.push_str(&format!("\nSystem Architecture: {}\n", architecture));
        }
        let completion = gateway.complete(&prompt).await?;
        Ok(disclaimed(&completion.text))
    }
}
