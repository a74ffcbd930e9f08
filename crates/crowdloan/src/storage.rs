//! Storage layout of the relay chain `Crowdloan` pallet.
//!
//! Each fund lives in `Crowdloan.Funds` (a `Twox64Concat` map keyed by para id) and
//! owns a default child trie holding `AccountId32 => (Balance, memo)` entries.

use crate::error::CrowdloanError;
use alloy_primitives::U256;
use crowdloan_primitives::AccountId32;
use parity_scale_codec::{Decode, DecodeAll, Encode};
use sp_core::{blake2_256, twox_128, twox_64};

/// Prefix of default child trie storage keys.
pub const CHILD_STORAGE_DEFAULT_PREFIX: &[u8] = b":child_storage:default:";

/// Domain separator hashed together with the fund index into the child trie id.
const CROWDLOAN_CHILD_DOMAIN: &[u8] = b"crowdloan";

/// Optional signer allowed to authorize contributions.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Verifier {
    /// Ed25519 public key.
    Ed25519([u8; 32]),
    /// Sr25519 public key.
    Sr25519([u8; 32]),
    /// Compressed ECDSA public key.
    Ecdsa([u8; 33]),
}

/// Most recent contribution marker of a fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum LastContribution {
    /// No contribution was ever made.
    Never,
    /// Contribution made before the ending period of auction `n`.
    PreEnding(u32),
    /// Contribution made `n` blocks into the ending period.
    Ending(u32),
}

/// Value of `Crowdloan.Funds` on the relay chain.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct FundInfo {
    /// Account that placed the deposit.
    pub depositor: AccountId32,
    /// Optional contribution verifier.
    pub verifier: Option<Verifier>,
    /// Deposit held from the depositor.
    pub deposit: u128,
    /// Total amount raised.
    pub raised: u128,
    /// Block after which the fund can be dissolved if unsuccessful.
    pub end: u32,
    /// Hard cap on contributions.
    pub cap: u128,
    /// Most recent contribution marker.
    pub last_contribution: LastContribution,
    /// First lease period bid on.
    pub first_period: u32,
    /// Last lease period bid on.
    pub last_period: u32,
    /// Unique index of the fund, seeds the child trie id.
    pub fund_index: u32,
}

/// Storage key of `Crowdloan.Funds(para_id)`.
pub fn funds_storage_key(para_id: u32) -> Vec<u8> {
    let encoded = para_id.encode();
    [
        twox_128(b"Crowdloan").as_slice(),
        twox_128(b"Funds").as_slice(),
        twox_64(&encoded).as_slice(),
        encoded.as_slice(),
    ]
    .concat()
}

/// Prefixed child trie key holding the contributions of fund `fund_index`.
pub fn fund_child_key(fund_index: u32) -> Vec<u8> {
    let mut seed = CROWDLOAN_CHILD_DOMAIN.to_vec();
    seed.extend_from_slice(&fund_index.encode());
    [CHILD_STORAGE_DEFAULT_PREFIX, blake2_256(&seed).as_slice()].concat()
}

/// Decodes a `Crowdloan.Funds` value.
pub fn decode_fund_info(raw: &[u8]) -> Result<FundInfo, CrowdloanError> {
    FundInfo::decode_all(&mut &raw[..]).map_err(|err| CrowdloanError::codec("fund info", err))
}

/// Decodes a child trie key into the contributor account.
pub fn decode_contributor(key: &[u8]) -> Result<AccountId32, CrowdloanError> {
    AccountId32::decode_all(&mut &key[..])
        .map_err(|err| CrowdloanError::codec("contributor key", err))
}

/// Decodes the balance of a contribution, ignoring the trailing memo.
pub fn decode_contribution(raw: &[u8]) -> Result<U256, CrowdloanError> {
    u128::decode(&mut &raw[..])
        .map(U256::from)
        .map_err(|err| CrowdloanError::codec("contribution balance", err))
}
