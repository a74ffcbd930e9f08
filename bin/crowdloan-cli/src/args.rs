use clap::Parser;
use crowdloan_rewards::{AggregatorConfig, CrowdloanConfig};
use std::path::PathBuf;

/// Reconciles crowdloan contributions and writes the reward reports.
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(
    name = "crowdloan-rewards",
    about = "Reconcile crowdloan contributions and compute rewards"
)]
pub(crate) struct CrowdloanArgs {
    /// TOML configuration file, overridden by the flags below
    #[arg(long, env = "CROWDLOAN_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Relay chain RPC endpoint (ws, wss, http or https)
    #[arg(long, env = "CROWDLOAN_ENDPOINT")]
    pub(crate) endpoint: Option<String>,

    /// Parachain whose crowdloan is reconciled
    #[arg(long, env = "CROWDLOAN_PARA_ID")]
    pub(crate) para_id: Option<u32>,

    /// Relay chain block height the crowdloan closed at
    #[arg(long = "block", env = "CROWDLOAN_BLOCK")]
    pub(crate) block_number: Option<u32>,

    /// Off-chain `address,amount` contributor file
    #[arg(long, env = "CROWDLOAN_CONTRIBUTORS_FILE")]
    pub(crate) contributors_file: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(long, env = "CROWDLOAN_OUTPUT_DIR")]
    pub(crate) output_dir: Option<PathBuf>,

    /// Aggregator account as an SS58 address in the canonical format
    #[arg(long, env = "CROWDLOAN_AGGREGATOR", conflicts_with = "aggregator_para_id")]
    pub(crate) aggregator: Option<String>,

    /// Aggregator account as the sovereign account of a parachain
    #[arg(long, env = "CROWDLOAN_AGGREGATOR_PARA_ID")]
    pub(crate) aggregator_para_id: Option<u32>,

    /// Contribution reads in flight
    #[arg(long, env = "CROWDLOAN_FETCH_CONCURRENCY")]
    pub(crate) fetch_concurrency: Option<usize>,
}

impl CrowdloanArgs {
    /// Applies the flags that were set on top of `config`.
    pub(crate) fn apply(self, mut config: CrowdloanConfig) -> CrowdloanConfig {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(para_id) = self.para_id {
            config.para_id = para_id;
        }
        if let Some(block_number) = self.block_number {
            config.block_number = Some(block_number);
        }
        if let Some(path) = self.contributors_file {
            config.contributors_file = path;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(address) = self.aggregator {
            config.aggregator = AggregatorConfig::Address(address);
        } else if let Some(para_id) = self.aggregator_para_id {
            config.aggregator = AggregatorConfig::Sovereign(para_id);
        }
        if let Some(concurrency) = self.fetch_concurrency {
            config.fetch_concurrency = concurrency;
        }
        config
    }
}
