use alloy_primitives::U256;
use crowdloan_primitives::{AccountId32, AmountError, DecodeError};
use jsonrpsee::core::client::Error as ClientError;
use sp_core::H256;
use thiserror::Error;

/// Errors raised by the reconciliation pipeline. All of them abort the run.
#[derive(Debug, Error)]
pub enum CrowdloanError {
    /// An address failed SS58 validation.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The relay chain does not know the requested block height.
    #[error("block #{0} not found on the relay chain")]
    BlockNotFound(u32),
    /// No crowdloan fund is registered for the parachain at the pinned block.
    #[error("no crowdloan fund for parachain {para_id} at block {block_hash:?}")]
    FundNotFound {
        /// Parachain the fund was looked up for.
        para_id: u32,
        /// Block the lookup was pinned to.
        block_hash: H256,
    },
    /// A contributor key was enumerated but has no value.
    #[error("contribution key {key} has no value at block {block_hash:?}")]
    MissingContribution {
        /// Hex encoded child trie key.
        key: String,
        /// Block the read was pinned to.
        block_hash: H256,
    },
    /// Child key paging returned a page that does not advance past the previous one.
    #[error("child key enumeration stalled at {key}")]
    StalledPaging {
        /// Hex encoded last key of the offending page.
        key: String,
    },
    /// A line of the contributor file is malformed.
    #[error("{source_name}:{line}: {reason}")]
    Parse {
        /// Name of the parsed input, usually its path.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },
    /// Merged data failed a consistency check.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// Raw storage could not be SCALE decoded.
    #[error("failed to decode {what}: {source}")]
    Codec {
        /// The value being decoded.
        what: &'static str,
        /// Underlying codec error.
        #[source]
        source: parity_scale_codec::Error,
    },
    /// A relay chain RPC request failed.
    #[error("rpc call {method} failed: {source}")]
    Rpc {
        /// JSON-RPC method name.
        method: &'static str,
        /// Transport or server error.
        #[source]
        source: ClientError,
    },
    /// Amount arithmetic overflowed.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// The reward of a contributor does not fit in 256 bits.
    #[error("reward for {0} overflows 256 bits")]
    RewardOverflow(AccountId32),
    /// File system access failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is invalid or incomplete.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CrowdloanError {
    /// Builds an [`CrowdloanError::Io`] with a context message.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Builds a [`CrowdloanError::Codec`] for `what`.
    pub const fn codec(what: &'static str, source: parity_scale_codec::Error) -> Self {
        Self::Codec { what, source }
    }
}

/// Consistency violations detected while merging contribution sources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// The aggregator account has no on-chain entry to replace.
    #[error("expected aggregate entry {0} missing, merge would silently double-report")]
    MissingAggregator(AccountId32),
    /// The merged total does not add up.
    #[error(
        "merged total {merged} does not equal on-chain {onchain} - aggregator {aggregator} + file {file}"
    )]
    TotalMismatch {
        /// Sum of the merged mapping.
        merged: U256,
        /// Sum of the on-chain mapping.
        onchain: U256,
        /// Removed aggregator amount.
        aggregator: U256,
        /// Sum of the file mapping.
        file: U256,
    },
    /// A contributor has no computed reward.
    #[error("no reward computed for contributor {0}")]
    MissingReward(AccountId32),
}
