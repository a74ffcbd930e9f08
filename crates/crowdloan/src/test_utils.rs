//! In-memory relay chain and fixtures for pipeline tests.

use crate::{
    error::CrowdloanError,
    rpc::RelayChainApi,
    storage::{fund_child_key, funds_storage_key, FundInfo, LastContribution, Verifier},
};
use async_trait::async_trait;
use crowdloan_primitives::AccountId32;
use parity_scale_codec::Encode;
use sp_core::H256;
use std::collections::{BTreeMap, HashMap};

/// Builds a fund record with the given index.
pub fn sample_fund(fund_index: u32) -> FundInfo {
    FundInfo {
        depositor: AccountId32::new([1u8; 32]),
        verifier: Some(Verifier::Ecdsa([2u8; 33])),
        deposit: 5_000_000_000_000,
        raised: 12_345,
        end: 20_000_000,
        cap: 1_000_000_000_000_000_000,
        last_contribution: LastContribution::Ending(42),
        first_period: 13,
        last_period: 20,
        fund_index,
    }
}

/// Relay chain state held in memory.
///
/// Child tries are kept ordered by key, matching the lexicographic iteration of a
/// real trie. A child entry with no value models a key that is enumerated but
/// cannot be read.
#[derive(Debug, Clone, Default)]
pub struct MockRelayChain {
    blocks: HashMap<u32, H256>,
    storage: HashMap<(H256, Vec<u8>), Vec<u8>>,
    children: HashMap<(H256, Vec<u8>), BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl MockRelayChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers block `number` with `hash`.
    pub fn with_block(mut self, number: u32, hash: H256) -> Self {
        self.blocks.insert(number, hash);
        self
    }

    /// Writes a top trie value.
    pub fn insert_storage(&mut self, at: H256, key: Vec<u8>, value: Vec<u8>) {
        self.storage.insert((at, key), value);
    }

    /// Writes a child trie entry, `None` leaves the value unreadable.
    pub fn insert_child(&mut self, at: H256, child_key: Vec<u8>, key: Vec<u8>, value: Option<Vec<u8>>) {
        self.children.entry((at, child_key)).or_default().insert(key, value);
    }

    /// Registers a crowdloan fund for `para_id` and its contributions at `at`.
    pub fn with_crowdloan(
        mut self,
        at: H256,
        para_id: u32,
        fund_index: u32,
        contributions: &[(AccountId32, u128)],
    ) -> Self {
        self.insert_storage(at, funds_storage_key(para_id), sample_fund(fund_index).encode());
        for (who, amount) in contributions {
            self.insert_child(
                at,
                fund_child_key(fund_index),
                who.encode(),
                Some((*amount, Vec::<u8>::new()).encode()),
            );
        }
        self
    }
}

#[async_trait]
impl RelayChainApi for MockRelayChain {
    async fn block_hash(&self, number: u32) -> Result<Option<H256>, CrowdloanError> {
        Ok(self.blocks.get(&number).copied())
    }

    async fn storage(&self, key: &[u8], at: H256) -> Result<Option<Vec<u8>>, CrowdloanError> {
        Ok(self.storage.get(&(at, key.to_vec())).cloned())
    }

    async fn child_keys_paged(
        &self,
        child_key: &[u8],
        count: u32,
        start_key: Option<&[u8]>,
        at: H256,
    ) -> Result<Vec<Vec<u8>>, CrowdloanError> {
        let Some(trie) = self.children.get(&(at, child_key.to_vec())) else {
            return Ok(Vec::new());
        };
        Ok(trie
            .keys()
            .filter(|key| start_key.map_or(true, |start| key.as_slice() > start))
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn child_storage(
        &self,
        child_key: &[u8],
        key: &[u8],
        at: H256,
    ) -> Result<Option<Vec<u8>>, CrowdloanError> {
        Ok(self
            .children
            .get(&(at, child_key.to_vec()))
            .and_then(|trie| trie.get(key))
            .cloned()
            .flatten())
    }
}
