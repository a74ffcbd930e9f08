use crate::amount::AmountError;
use alloy_primitives::U256;
use sp_core::crypto::AccountId32;
use std::collections::HashMap;

/// Contributor to amount mapping that iterates in insertion order.
///
/// Report files are diffed between runs, so the order entries were first seen in
/// is preserved through every pipeline stage. Each account appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionMap {
    entries: Vec<(AccountId32, U256)>,
    index: HashMap<AccountId32, usize>,
}

impl ContributionMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(account, amount)` pairs, summing repeated accounts.
    pub fn from_entries<I>(entries: I) -> Result<Self, AmountError>
    where
        I: IntoIterator<Item = (AccountId32, U256)>,
    {
        let mut map = Self::new();
        for (account, amount) in entries {
            map.add(account, amount)?;
        }
        Ok(map)
    }

    /// Adds `amount` to the entry of `account`, appending a new entry if needed.
    pub fn add(&mut self, account: AccountId32, amount: U256) -> Result<(), AmountError> {
        if let Some(&position) = self.index.get(&account) {
            let slot = &mut self.entries[position].1;
            *slot = slot.checked_add(amount).ok_or(AmountError::SumOverflow)?;
        } else {
            self.index.insert(account.clone(), self.entries.len());
            self.entries.push((account, amount));
        }
        Ok(())
    }

    /// Removes the entry of `account`, keeping the relative order of the rest.
    pub fn remove(&mut self, account: &AccountId32) -> Option<U256> {
        let position = self.index.remove(account)?;
        let (_, amount) = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(amount)
    }

    /// Returns the amount recorded for `account`.
    pub fn get(&self, account: &AccountId32) -> Option<U256> {
        self.index.get(account).map(|&position| self.entries[position].1)
    }

    /// Returns true if `account` has an entry.
    pub fn contains(&self, account: &AccountId32) -> bool {
        self.index.contains_key(account)
    }

    /// Number of contributors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no contributors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (AccountId32, U256)> {
        self.entries.iter()
    }

    /// Sum of all amounts.
    pub fn total(&self) -> Result<U256, AmountError> {
        self.entries.iter().try_fold(U256::ZERO, |acc, (_, amount)| {
            acc.checked_add(*amount).ok_or(AmountError::SumOverflow)
        })
    }
}

impl<'a> IntoIterator for &'a ContributionMap {
    type Item = &'a (AccountId32, U256);
    type IntoIter = std::slice::Iter<'a, (AccountId32, U256)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
