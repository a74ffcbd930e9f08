use crate::error::{CrowdloanError, IntegrityError};
use alloy_primitives::U256;
use crowdloan_primitives::{AccountId32, AmountError, ContributionMap};
use tracing::{info, warn};

/// Result of merging on-chain and file contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Canonical contributor mapping: on-chain order, then file-only contributors.
    pub merged: ContributionMap,
    /// Sum of the on-chain mapping before the aggregator was removed.
    pub onchain_total: U256,
    /// On-chain amount of the aggregator account that was replaced.
    pub aggregator_amount: U256,
    /// Sum of the file mapping.
    pub file_total: U256,
}

/// Replaces the aggregator's on-chain entry with the per-contributor file records.
///
/// The aggregator contributed on behalf of the users listed in the file, so its
/// on-chain amount is dropped and the file entries are unioned in, summing with
/// any direct on-chain contribution of the same account. The aggregator must be
/// present on-chain, and the merged total must equal
/// `onchain - aggregator + file`.
pub fn merge_contributions(
    onchain: &ContributionMap,
    file: &ContributionMap,
    aggregator: &AccountId32,
) -> Result<MergeOutcome, CrowdloanError> {
    let onchain_total = onchain.total()?;
    let file_total = file.total()?;

    let mut merged = onchain.clone();
    let aggregator_amount = merged
        .remove(aggregator)
        .ok_or_else(|| IntegrityError::MissingAggregator(aggregator.clone()))?;

    let mut overlapping = 0usize;
    for (account, amount) in file {
        if merged.contains(account) {
            overlapping += 1;
        }
        merged.add(account.clone(), *amount)?;
    }

    let merged_total = merged.total()?;
    let expected = (onchain_total - aggregator_amount)
        .checked_add(file_total)
        .ok_or(AmountError::SumOverflow)?;
    if merged_total != expected {
        return Err(IntegrityError::TotalMismatch {
            merged: merged_total,
            onchain: onchain_total,
            aggregator: aggregator_amount,
            file: file_total,
        }
        .into());
    }

    if aggregator_amount != file_total {
        let (delta, direction) = if aggregator_amount > file_total {
            (aggregator_amount - file_total, "on-chain exceeds file")
        } else {
            (file_total - aggregator_amount, "file exceeds on-chain")
        };
        warn!(
            aggregator = %aggregator,
            aggregator_amount = %aggregator_amount,
            file_total = %file_total,
            delta = %delta,
            direction,
            "aggregator amount does not match reconciled file total"
        );
    }

    info!(
        contributors = merged.len(),
        overlapping,
        total = %merged_total,
        "merged contributions"
    );
    Ok(MergeOutcome { merged, onchain_total, aggregator_amount, file_total })
}
