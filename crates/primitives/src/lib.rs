//! Primitive types shared by the crowdloan reconciliation pipeline.
//!
//! This crate provides:
//! - SS58 address normalization across network prefixes
//! - Exact decimal amount parsing and rendering
//! - The insertion-ordered contribution mapping used by every pipeline stage

/// SS58 address decoding, encoding and normalization.
pub mod address;
/// Decimal string conversion for fixed-point token amounts.
pub mod amount;
/// Insertion-ordered contributor to amount mapping.
pub mod contributions;

pub use address::{
    parachain_sovereign_account, DecodeError, Ss58Normalizer, BIFROST_PREFIX, POLKADOT_PREFIX,
};
pub use alloy_primitives::U256;
pub use amount::{format_decimal, parse_decimal, pow10, AmountError, ParsedAmount};
pub use contributions::ContributionMap;
pub use sp_core::crypto::AccountId32;
