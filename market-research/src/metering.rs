//! Usage metering and the budget circuit breaker.
//!
//! Every gateway call made by any agent goes through [`MeteredGateway`]. It
//! accumulates token counts and cost into a [`UsageLedger`], prints a
//! per-call usage line, and raises [`BudgetExceededError`] once cumulative
//! cost crosses the configured ceiling. The error is typed so the CLI
//! boundary decides whether it becomes a process exit; the core never calls
//! `exit` itself.
//!
//! The ceiling is checked after a call's usage lands, so a run can overshoot
//! by at most one call's worth of cost. Once over, no further call is
//! issued.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use llm_gateway::{Completion, LlmGateway};
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;

/// Cumulative spend crossed the configured ceiling.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cost ceiling exceeded: spent {spent:.4} of {ceiling:.4} allowed")]
pub struct BudgetExceededError {
    pub spent: f64,
    pub ceiling: f64,
}

/// Running totals for one planner instance.
///
/// Reset only by constructing a new planner.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageLedger {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub calls: u64,
}

impl UsageLedger {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Metering decorator around the raw LLM gateway.
pub struct MeteredGateway {
    inner: Arc<dyn LlmGateway>,
    billing: BillingConfig,
    ledger: Mutex<UsageLedger>,
}

impl MeteredGateway {
    pub fn new(inner: Arc<dyn LlmGateway>, billing: BillingConfig) -> Self {
        Self {
            inner,
            billing,
            ledger: Mutex::new(UsageLedger::default()),
        }
    }

    /// Snapshot of the current totals.
    pub fn ledger(&self) -> UsageLedger {
        *self.ledger.lock().expect("usage ledger poisoned")
    }

    /// Issue one metered gateway call.
    ///
    /// Gateway errors propagate unchanged. A completion without usage
    /// metadata passes through with zero accounting rather than failing the
    /// stage.
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        {
            let ledger = self.ledger.lock().expect("usage ledger poisoned");
            if ledger.cost > self.billing.cost_ceiling {
                return Err(BudgetExceededError {
                    spent: ledger.cost,
                    ceiling: self.billing.cost_ceiling,
                }
                .into());
            }
        }

        let completion = self.inner.complete(prompt).await?;

        let Some(usage) = completion.usage else {
            tracing::warn!("gateway returned no usage metadata, call not accounted");
            return Ok(completion);
        };

        let call_cost = (usage.prompt_tokens as f64 / 1e6) * self.billing.input_rate_per_mtok
            + (usage.completion_tokens as f64 / 1e6) * self.billing.output_rate_per_mtok;

        let snapshot = {
            let mut ledger = self.ledger.lock().expect("usage ledger poisoned");
            ledger.input_tokens += usage.prompt_tokens;
            ledger.output_tokens += usage.completion_tokens;
            ledger.cost += call_cost;
            ledger.calls += 1;
            *ledger
        };

        println!(
            "[usage] call {}: in={} out={} cost={:.4} (total {:.4})",
            snapshot.calls, usage.prompt_tokens, usage.completion_tokens, call_cost, snapshot.cost
        );

        if snapshot.cost > self.billing.cost_ceiling {
            return Err(BudgetExceededError {
                spent: snapshot.cost,
                ceiling: self.billing.cost_ceiling,
            }
            .into());
        }

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_gateway::{GatewayError, TokenUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedUsageGateway {
        usage: Option<TokenUsage>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmGateway for FixedUsageGateway {
        async fn complete(&self, _prompt: &str) -> Result<Completion, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Completion {
                text: "ok".to_string(),
                usage: self.usage,
            })
        }
    }

    fn billing(input: f64, output: f64, ceiling: f64) -> BillingConfig {
        BillingConfig {
            input_rate_per_mtok: input,
            output_rate_per_mtok: output,
            cost_ceiling: ceiling,
        }
    }

    #[tokio::test]
    async fn cost_accumulates_additively() {
        let inner = Arc::new(FixedUsageGateway {
            usage: Some(TokenUsage {
                prompt_tokens: 1_000,
                completion_tokens: 500,
                total_tokens: 1_500,
            }),
            calls: AtomicUsize::new(0),
        });
        let metered = MeteredGateway::new(inner, billing(30.0, 60.0, 100.0));

        for _ in 0..3 {
            metered.complete("p").await.unwrap();
        }

        let ledger = metered.ledger();
        assert_eq!(ledger.calls, 3);
        assert_eq!(ledger.input_tokens, 3_000);
        assert_eq!(ledger.output_tokens, 1_500);
        let expected = 3.0 * ((1_000.0 / 1e6) * 30.0 + (500.0 / 1e6) * 60.0);
        assert!((ledger.cost - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn ceiling_breach_is_typed_and_blocks_further_calls() {
        let inner = Arc::new(FixedUsageGateway {
            usage: Some(TokenUsage {
                prompt_tokens: 1_000_000,
                completion_tokens: 0,
                total_tokens: 1_000_000,
            }),
            calls: AtomicUsize::new(0),
        });
        let calls = Arc::clone(&inner);
        // One call costs 30.0 against a 10.0 ceiling.
        let metered = MeteredGateway::new(inner, billing(30.0, 60.0, 10.0));

        let err = metered.complete("p").await.unwrap_err();
        assert!(err.downcast_ref::<BudgetExceededError>().is_some());

        // The ledger is over the ceiling; the next call is refused before
        // reaching the gateway.
        let err = metered.complete("p").await.unwrap_err();
        assert!(err.downcast_ref::<BudgetExceededError>().is_some());
        assert_eq!(calls.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_usage_is_not_accounted() {
        let inner = Arc::new(FixedUsageGateway {
            usage: None,
            calls: AtomicUsize::new(0),
        });
        let metered = MeteredGateway::new(inner, billing(30.0, 60.0, 10.0));

        let completion = metered.complete("p").await.unwrap();
        assert_eq!(completion.text, "ok");

        let ledger = metered.ledger();
        assert_eq!(ledger.calls, 0);
        assert_eq!(ledger.cost, 0.0);
    }
}
