//! Stage agents for the market research pipeline.
//!
//! Each agent is a stateless prompt skeleton plus a `run` method that fills
//! in the supplied fields, delegates to the metered gateway, and prefixes
//! the disclaimer. All pipeline logic lives in the planner; agents only
//! format and call.

pub mod company;
pub mod geo;
pub mod positioning;
pub mod ranking;
pub mod segment;
pub mod vertical;

pub use company::CompanyAgent;
pub use geo::GeoAgent;
pub use positioning::PositioningAgent;
pub use ranking::RankingAgent;
pub use segment::SegmentAgent;
pub use vertical::VerticalAgent;

/// Prefixed to every disclaimed stage output.
pub const DISCLAIMER: &str =
    "Disclaimer: The following data is synthetic and generated for illustrative purposes only.";

/// Standard disclaimed wrapping for agent output.
pub(crate) fn disclaimed(text: &str) -> String {
    format!("{}\n\n{}", DISCLAIMER, text.trim())
}
