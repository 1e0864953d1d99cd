//! Sequential multi-agent market research pipeline.
//!
//! A planner drives six prompt-template agents through one strict sequence
//! (vertical -> geo -> segment -> positioning -> optional company fit ->
//! ranking), threading accumulating context between them, metering token
//! cost against a hard budget ceiling, and assembling a delimited report
//! plus a CSV export of the segment ranking table.

pub mod agents;
pub mod cli;
pub mod config;
pub mod export;
pub mod metering;
pub mod planner;
pub mod retrieval;

pub use config::{BillingConfig, GeoMode, RunConfig};
pub use metering::{BudgetExceededError, MeteredGateway, UsageLedger};
pub use planner::{PipelineContext, Planner};
pub use retrieval::{ContextProvider, RetrievalIndex};
