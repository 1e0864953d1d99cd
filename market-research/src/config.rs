//! Run configuration and billing settings.
//!
//! `RunConfig` is fixed at planner construction and never mutated during a
//! run. `BillingConfig` carries the per-token rates and the spend ceiling;
//! it is injected into the metering wrapper so tests can supply arbitrary
//! rates instead of patching module constants.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Geography mode for the geo segmentation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoMode {
    /// One target region, geo-filtered retrieval queries.
    Single,
    /// Surface and rank multiple candidate countries.
    Multi,
}

impl GeoMode {
    /// Resolve the effective mode for one run.
    ///
    /// Multi mode activates when configured explicitly, when the region is a
    /// global placeholder, or when the user prompt asks for a comparison
    /// across geographies.
    pub fn resolve(configured: GeoMode, region: &str, user_prompt: &str) -> GeoMode {
        if configured == GeoMode::Multi {
            return GeoMode::Multi;
        }
        let region = region.trim();
        if region.eq_ignore_ascii_case("all") || region.eq_ignore_ascii_case("global") {
            return GeoMode::Multi;
        }
        if user_prompt.to_lowercase().contains("across geographies") {
            return GeoMode::Multi;
        }
        GeoMode::Single
    }
}

/// Immutable per-run settings for the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Target IoT vertical (e.g. "Smart Cities").
    pub vertical: String,
    /// Target region, or "ALL"/"Global" for multi-geography mode.
    pub region: String,
    /// Optional system architecture hint for the positioning stage.
    pub architecture: Option<String>,
    /// Configured geography mode (the prompt can still escalate to multi).
    pub geo_mode: GeoMode,
    /// Root directory of the retrieval document set.
    pub doc_root: PathBuf,
    /// Master switch for retrieval context.
    pub retrieval_enabled: bool,
    /// Directory for reports and exported tables.
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            vertical: "Smart Cities".to_string(),
            region: "Finland".to_string(),
            architecture: None,
            geo_mode: GeoMode::Single,
            doc_root: PathBuf::from("docs"),
            retrieval_enabled: true,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Name of the company capabilities file under the document root.
///
/// Presence and non-emptiness of this file gate the company-fit stage.
pub const COMPANY_CAPABILITIES_FILE: &str = "company_capabilities.txt";

/// Billing rates (per million tokens) and the per-run spend ceiling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BillingConfig {
    pub input_rate_per_mtok: f64,
    pub output_rate_per_mtok: f64,
    pub cost_ceiling: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        // Published gpt-4 list prices; ceiling sized for a handful of runs.
        Self {
            input_rate_per_mtok: 30.0,
            output_rate_per_mtok: 60.0,
            cost_ceiling: 10.0,
        }
    }
}

impl BillingConfig {
    /// Build from `LLM_INPUT_RATE`, `LLM_OUTPUT_RATE` and `COST_CEILING`
    /// env vars, falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            input_rate_per_mtok: env_f64("LLM_INPUT_RATE", defaults.input_rate_per_mtok),
            output_rate_per_mtok: env_f64("LLM_OUTPUT_RATE", defaults.output_rate_per_mtok),
            cost_ceiling: env_f64("COST_CEILING", defaults.cost_ceiling),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_region_stays_single() {
        let mode = GeoMode::resolve(GeoMode::Single, "Finland", "Smart irrigation systems");
        assert_eq!(mode, GeoMode::Single);
    }

    #[test]
    fn global_region_escalates_to_multi() {
        let mode = GeoMode::resolve(GeoMode::Single, "Global", "Smart irrigation systems");
        assert_eq!(mode, GeoMode::Multi);
    }

    #[test]
    fn comparison_prompt_escalates_to_multi() {
        let mode = GeoMode::resolve(
            GeoMode::Single,
            "Finland",
            "Compare smart metering adoption across geographies",
        );
        assert_eq!(mode, GeoMode::Multi);
    }
}
