use crate::error::CrowdloanError;
use alloy_primitives::U256;
use crowdloan_primitives::{pow10, ContributionMap};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Decimals of the relay chain token contributions are denominated in.
pub const SOURCE_DECIMALS: u32 = 10;

/// Decimals of the reward token.
pub const TARGET_DECIMALS: u32 = 18;

/// Reward tokens paid per contributed relay chain token.
pub const REWARD_MULTIPLIER: u64 = 100;

/// Conversion from contributed smallest units into reward smallest units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Decimals of the contributed token.
    pub source_decimals: u32,
    /// Decimals of the reward token.
    pub target_decimals: u32,
    /// Whole reward tokens per whole contributed token.
    pub multiplier: u64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            source_decimals: SOURCE_DECIMALS,
            target_decimals: TARGET_DECIMALS,
            multiplier: REWARD_MULTIPLIER,
        }
    }
}

impl RewardPolicy {
    /// Creates a policy.
    pub const fn new(source_decimals: u32, target_decimals: u32, multiplier: u64) -> Self {
        Self { source_decimals, target_decimals, multiplier }
    }

    /// Checks that the policy describes a representable, non-zero conversion.
    pub fn validate(&self) -> Result<(), CrowdloanError> {
        if self.target_decimals < self.source_decimals {
            return Err(CrowdloanError::Config(format!(
                "reward decimals {} must not be lower than contribution decimals {}",
                self.target_decimals, self.source_decimals
            )));
        }
        if self.multiplier == 0 {
            return Err(CrowdloanError::Config("reward multiplier must be positive".to_string()));
        }
        self.factor().map(|_| ())
    }

    /// Reward smallest units paid per contributed smallest unit:
    /// `10^(target - source) * multiplier`.
    pub fn factor(&self) -> Result<U256, CrowdloanError> {
        let shift = self.target_decimals.checked_sub(self.source_decimals).ok_or_else(|| {
            CrowdloanError::Config("reward decimals below contribution decimals".to_string())
        })?;
        pow10(shift)
            .and_then(|scale| scale.checked_mul(U256::from(self.multiplier)))
            .ok_or_else(|| CrowdloanError::Config("reward factor overflows 256 bits".to_string()))
    }

    /// Reward for `amount` contributed smallest units, `None` on overflow.
    pub fn reward(&self, amount: U256) -> Option<U256> {
        self.factor().ok().and_then(|factor| amount.checked_mul(factor))
    }

    /// Computes the reward of every contributor, preserving order.
    pub fn compute_rewards(
        &self,
        contributions: &ContributionMap,
    ) -> Result<ContributionMap, CrowdloanError> {
        let factor = self.factor()?;
        let mut rewards = ContributionMap::new();
        for (account, amount) in contributions {
            let reward = amount
                .checked_mul(factor)
                .ok_or_else(|| CrowdloanError::RewardOverflow(account.clone()))?;
            rewards.add(account.clone(), reward)?;
        }

        info!(
            contributors = rewards.len(),
            total = %rewards.total()?,
            multiplier = self.multiplier,
            "computed rewards"
        );
        Ok(rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdloan_primitives::{format_decimal, AccountId32};

    #[test]
    fn reward_is_exact() {
        let policy = RewardPolicy::default();
        let five_dot = U256::from(50_000_000_000u64);
        assert_eq!(policy.reward(five_dot), Some(U256::from(5u64) * pow10(20).unwrap()));

        let odd = U256::from(123_456_789_012_345u64);
        assert_eq!(
            policy.reward(odd),
            Some(odd * U256::from(100_000_000u64) * U256::from(100u64))
        );
    }

    #[test]
    fn reward_rendering_matches_shifted_contribution() {
        let policy = RewardPolicy::default();
        for raw in [1u64, 12_345_000_000, 50_000_000_000, 987_654_321_987] {
            let amount = U256::from(raw);
            let reward = policy.reward(amount).unwrap();
            assert_eq!(
                format_decimal(reward, policy.target_decimals),
                format_decimal(amount, policy.source_decimals - 2)
            );
        }
    }

    #[test]
    fn compute_rewards_preserves_order() {
        let contributions = ContributionMap::from_entries([
            (AccountId32::new([3u8; 32]), U256::from(3u64)),
            (AccountId32::new([1u8; 32]), U256::from(1u64)),
        ])
        .unwrap();

        let rewards = RewardPolicy::default().compute_rewards(&contributions).unwrap();
        let entries: Vec<_> = rewards.iter().cloned().collect();
        assert_eq!(
            entries,
            vec![
                (AccountId32::new([3u8; 32]), U256::from(30_000_000_000u64)),
                (AccountId32::new([1u8; 32]), U256::from(10_000_000_000u64)),
            ]
        );
    }

    #[test]
    fn overflowing_reward_is_reported() {
        let who = AccountId32::new([7u8; 32]);
        let contributions = ContributionMap::from_entries([(who.clone(), U256::MAX)]).unwrap();
        let err = RewardPolicy::default().compute_rewards(&contributions).unwrap_err();
        assert!(matches!(err, CrowdloanError::RewardOverflow(account) if account == who));
    }

    #[test]
    fn rejects_invalid_policies() {
        assert!(RewardPolicy::new(18, 10, 100).validate().is_err());
        assert!(RewardPolicy::new(10, 18, 0).validate().is_err());
        assert!(RewardPolicy::new(0, 90, 1).validate().is_err());
        assert!(RewardPolicy::default().validate().is_ok());
        assert_eq!(RewardPolicy::default().factor().unwrap(), U256::from(10_000_000_000u64));
    }
}
