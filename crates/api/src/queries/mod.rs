//! GraphQL query definitions.

pub mod market;
pub mod targets;

pub use market::GetMarketSnapshot;
pub use targets::GetMarketTargets;
