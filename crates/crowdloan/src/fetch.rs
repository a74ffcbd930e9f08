use crate::{
    error::CrowdloanError,
    rpc::RelayChainApi,
    storage::{decode_contribution, decode_contributor, decode_fund_info, fund_child_key, funds_storage_key, FundInfo},
};
use crowdloan_primitives::{parse_decimal, ContributionMap, Ss58Normalizer};
use futures::{stream, StreamExt, TryStreamExt};
use sp_core::H256;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default number of child keys requested per page.
pub const DEFAULT_KEY_PAGE_SIZE: u32 = 1000;

/// Tuning of the on-chain fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Child keys requested per `childstate_getKeysPaged` call.
    pub page_size: u32,
    /// Maximum number of contribution reads in flight.
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_KEY_PAGE_SIZE, concurrency: 1 }
    }
}

/// Contributions read from the relay chain at one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainContributions {
    /// Block every read was pinned to.
    pub block_hash: H256,
    /// Fund record the child trie was derived from.
    pub fund: FundInfo,
    /// Contributions in child trie key order.
    pub contributions: ContributionMap,
}

/// Reads every contribution to the crowdloan of `para_id` as of block `block_number`.
pub async fn fetch_onchain_contributions<R>(
    rpc: &R,
    para_id: u32,
    block_number: u32,
    options: FetchOptions,
) -> Result<OnchainContributions, CrowdloanError>
where
    R: RelayChainApi + ?Sized,
{
    let block_hash =
        rpc.block_hash(block_number).await?.ok_or(CrowdloanError::BlockNotFound(block_number))?;
    info!(block_number, ?block_hash, "resolved crowdloan closure block");

    let raw_fund = rpc
        .storage(&funds_storage_key(para_id), block_hash)
        .await?
        .ok_or(CrowdloanError::FundNotFound { para_id, block_hash })?;
    let fund = decode_fund_info(&raw_fund)?;
    let child_key = fund_child_key(fund.fund_index);
    info!(para_id, fund_index = fund.fund_index, raised = %fund.raised, "located crowdloan fund");

    let keys = enumerate_child_keys(rpc, &child_key, options.page_size, block_hash).await?;
    info!(keys = keys.len(), "enumerated contributor keys");

    let child_key = child_key.as_slice();
    let values: Vec<(Vec<u8>, Option<Vec<u8>>)> = stream::iter(keys)
        .map(|key| async move {
            let value = rpc.child_storage(child_key, &key, block_hash).await?;
            Ok::<_, CrowdloanError>((key, value))
        })
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await?;

    let mut contributions = ContributionMap::new();
    for (key, value) in values {
        let value = value.ok_or_else(|| CrowdloanError::MissingContribution {
            key: format!("0x{}", hex::encode(&key)),
            block_hash,
        })?;
        contributions.add(decode_contributor(&key)?, decode_contribution(&value)?)?;
    }

    info!(
        contributors = contributions.len(),
        total = %contributions.total()?,
        "fetched on-chain contributions"
    );
    Ok(OnchainContributions { block_hash, fund, contributions })
}

async fn enumerate_child_keys<R>(
    rpc: &R,
    child_key: &[u8],
    page_size: u32,
    at: H256,
) -> Result<Vec<Vec<u8>>, CrowdloanError>
where
    R: RelayChainApi + ?Sized,
{
    if page_size == 0 {
        return Err(CrowdloanError::Config("key page size must be positive".to_string()));
    }

    // Providers may cap pages below `page_size`, so only an empty page or a cursor
    // that stops advancing ends the enumeration.
    let mut keys = Vec::new();
    let mut start_key: Option<Vec<u8>> = None;
    loop {
        let page = rpc.child_keys_paged(child_key, page_size, start_key.as_deref(), at).await?;
        debug!(page = page.len(), seen = keys.len() + page.len(), "fetched contributor key page");

        let Some(last) = page.last().cloned() else {
            return Ok(keys);
        };
        if start_key.as_ref().is_some_and(|start| last <= *start) {
            return Err(CrowdloanError::StalledPaging { key: format!("0x{}", hex::encode(&last)) });
        }
        start_key = Some(last);
        keys.extend(page);
    }
}

/// Layout of the off-chain contributor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    /// SS58 prefix the addresses in the file are encoded with.
    pub source_prefix: u16,
    /// Decimals of the source token the amounts are denominated in.
    pub decimals: u32,
}

/// Reads `address,amount` lines from `path`.
pub fn load_file_contributions(
    path: &Path,
    normalizer: &Ss58Normalizer,
    format: FileFormat,
) -> Result<ContributionMap, CrowdloanError> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| CrowdloanError::io(format!("failed to read {}", path.display()), err))?;
    let contributions =
        parse_file_contributions(&text, &path.display().to_string(), normalizer, format)?;
    info!(
        path = %path.display(),
        contributors = contributions.len(),
        total = %contributions.total()?,
        "loaded file contributions"
    );
    Ok(contributions)
}

/// Parses `address,amount` lines, summing amounts of repeated addresses.
///
/// Blank lines are skipped. Any malformed line aborts the whole parse so that no
/// contributor is silently dropped.
pub fn parse_file_contributions(
    text: &str,
    source_name: &str,
    normalizer: &Ss58Normalizer,
    format: FileFormat,
) -> Result<ContributionMap, CrowdloanError> {
    let mut contributions = ContributionMap::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parse_error = |reason: String| CrowdloanError::Parse {
            source_name: source_name.to_string(),
            line: line_number,
            reason,
        };

        let (address, amount) = line
            .split_once(',')
            .ok_or_else(|| parse_error("expected `address,amount`".to_string()))?;
        let (address, amount) = (address.trim(), amount.trim());
        if address.is_empty() {
            return Err(parse_error("missing address".to_string()));
        }
        if amount.contains(',') {
            return Err(parse_error("unexpected extra field".to_string()));
        }

        let account = normalizer.decode(address, format.source_prefix)?;
        let parsed =
            parse_decimal(amount, format.decimals).map_err(|err| parse_error(err.to_string()))?;
        if parsed.truncated {
            warn!(
                line = line_number,
                amount,
                decimals = format.decimals,
                "amount has excess fractional digits, truncated"
            );
        }
        contributions.add(account, parsed.value)?;
    }
    Ok(contributions)
}
