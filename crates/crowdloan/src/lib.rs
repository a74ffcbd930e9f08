//! Crowdloan contribution reconciliation and reward computation.
//!
//! This crate provides the offline pipeline that turns a finished crowdloan into a
//! reward payout:
//! - Fetching contributions from the relay chain crowdloan child trie
//! - Loading contributions recorded off-chain by an aggregator
//! - Merging both sources under canonical addresses with integrity checks
//! - Computing rewards with exact integer arithmetic and writing reports

/// Pipeline configuration and defaults.
pub mod config;
/// Error types for every pipeline stage.
pub mod error;
/// On-chain and file contribution sources.
pub mod fetch;
/// Merging of the on-chain and file contribution sets.
pub mod merge;
/// End-to-end pipeline driver.
pub mod pipeline;
/// Report rendering and writing.
pub mod report;
/// Reward policy and computation.
pub mod rewards;
/// Relay chain JSON-RPC access.
pub mod rpc;
/// Relay chain crowdloan storage layout.
pub mod storage;

/// In-memory relay chain used by tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{AggregatorConfig, CrowdloanConfig};
pub use error::{CrowdloanError, IntegrityError};
pub use fetch::{
    fetch_onchain_contributions, load_file_contributions, parse_file_contributions, FetchOptions,
    FileFormat, OnchainContributions,
};
pub use merge::{merge_contributions, MergeOutcome};
pub use pipeline::{run, RunSummary};
pub use report::{render_reports, write_reports, Reports};
pub use rewards::RewardPolicy;
pub use rpc::{RelayChainApi, RelayChainClient};
