use crate::{
    config::CrowdloanConfig,
    error::CrowdloanError,
    fetch::{fetch_onchain_contributions, load_file_contributions},
    merge::merge_contributions,
    report::{render_reports, write_reports},
    rpc::RelayChainApi,
};
use alloy_primitives::U256;
use sp_core::H256;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Block the on-chain state was read at.
    pub block_hash: H256,
    /// Number of reconciled contributors.
    pub contributors: usize,
    /// Sum of all reconciled contributions, in smallest source units.
    pub contributed_total: U256,
    /// Sum of all rewards, in smallest target units.
    pub reward_total: U256,
    /// Paths of the written reports.
    pub artifacts: Vec<PathBuf>,
}

/// Runs the full reconciliation: fetch, merge, compute rewards and write reports.
///
/// Nothing is written unless every earlier stage succeeded.
pub async fn run<R>(config: &CrowdloanConfig, rpc: &R) -> Result<RunSummary, CrowdloanError>
where
    R: RelayChainApi + ?Sized,
{
    config.validate()?;
    let normalizer = config.normalizer();
    let aggregator = config.aggregator_account()?;
    let block_number = config.block_number()?;
    info!(
        para_id = config.para_id,
        block_number,
        aggregator = %normalizer.encode(&aggregator),
        "starting crowdloan reconciliation"
    );

    let onchain =
        fetch_onchain_contributions(rpc, config.para_id, block_number, config.fetch_options())
            .await?;
    let file =
        load_file_contributions(&config.contributors_file, &normalizer, config.file_format())?;

    let outcome = merge_contributions(&onchain.contributions, &file, &aggregator)?;
    let rewards = config.rewards.compute_rewards(&outcome.merged)?;

    let reports = render_reports(&outcome.merged, &rewards, &normalizer, &config.rewards)?;
    let artifacts = write_reports(&config.output_dir, &reports)?;

    let summary = RunSummary {
        block_hash: onchain.block_hash,
        contributors: outcome.merged.len(),
        contributed_total: outcome.merged.total()?,
        reward_total: rewards.total()?,
        artifacts,
    };
    info!(
        contributors = summary.contributors,
        contributed = %summary.contributed_total,
        rewards = %summary.reward_total,
        output_dir = %config.output_dir.display(),
        "crowdloan reconciliation complete"
    );
    Ok(summary)
}
