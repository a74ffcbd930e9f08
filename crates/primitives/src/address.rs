use sp_core::crypto::{AccountId32, Ss58AddressFormat, Ss58Codec};
use thiserror::Error;

/// SS58 prefix of the Polkadot relay chain, used as the canonical encoding.
pub const POLKADOT_PREFIX: u16 = 0;

/// SS58 prefix of Bifrost, the network the off-chain contributor list is encoded for.
pub const BIFROST_PREFIX: u16 = 6;

/// Errors raised while decoding an SS58 address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Base58, checksum or payload length validation failed.
    #[error("invalid ss58 address {address:?}: {reason}")]
    Invalid {
        /// The offending address string.
        address: String,
        /// Reason reported by the SS58 codec.
        reason: String,
    },
    /// The address is well formed but encoded for another network.
    #[error("address {address} is encoded with prefix {found}, expected {expected}")]
    PrefixMismatch {
        /// The offending address string.
        address: String,
        /// Prefix the caller declared for the source.
        expected: u16,
        /// Prefix embedded in the address.
        found: u16,
    },
}

/// Re-encodes account addresses under a single canonical network prefix.
///
/// Two addresses that carry the same public key normalize to the same string no
/// matter which network prefix they were originally encoded with, which makes the
/// canonical string usable as a join key across datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ss58Normalizer {
    canonical_prefix: u16,
}

impl Default for Ss58Normalizer {
    fn default() -> Self {
        Self::new(POLKADOT_PREFIX)
    }
}

impl Ss58Normalizer {
    /// Creates a normalizer that emits addresses under `canonical_prefix`.
    pub const fn new(canonical_prefix: u16) -> Self {
        Self { canonical_prefix }
    }

    /// Returns the prefix canonical addresses are encoded with.
    pub const fn canonical_prefix(&self) -> u16 {
        self.canonical_prefix
    }

    /// Decodes `address`, requiring it to be encoded under `source_prefix`.
    pub fn decode(&self, address: &str, source_prefix: u16) -> Result<AccountId32, DecodeError> {
        let (account, format) =
            AccountId32::from_ss58check_with_version(address).map_err(|err| {
                DecodeError::Invalid { address: address.to_string(), reason: format!("{err:?}") }
            })?;

        let found = u16::from(format);
        if found != source_prefix {
            return Err(DecodeError::PrefixMismatch {
                address: address.to_string(),
                expected: source_prefix,
                found,
            });
        }
        Ok(account)
    }

    /// Encodes `account` under the canonical prefix.
    pub fn encode(&self, account: &AccountId32) -> String {
        account.to_ss58check_with_version(Ss58AddressFormat::custom(self.canonical_prefix))
    }

    /// Decodes `address` under `source_prefix` and re-encodes it canonically.
    pub fn normalize(&self, address: &str, source_prefix: u16) -> Result<String, DecodeError> {
        self.decode(address, source_prefix).map(|account| self.encode(&account))
    }
}

/// Returns the relay chain sovereign account of parachain `para_id`.
///
/// The account is `b"para" ++ para_id (LE) ++ zero padding`.
pub fn parachain_sovereign_account(para_id: u32) -> AccountId32 {
    let mut raw = [0u8; 32];
    raw[..4].copy_from_slice(b"para");
    raw[4..8].copy_from_slice(&para_id.to_le_bytes());
    AccountId32::new(raw)
}
