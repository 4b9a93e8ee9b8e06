//! # Reward Distributor
//!
//! Owner-only administration of distribution periods.
//!
//! ```text
//! Idle ──notify──▶ Active ──time ≥ finish──▶ Expired
//!                    ▲                          │
//!                    └─────────notify───────────┘
//! ```
//!
//! A notification during an active period folds the unissued remainder into
//! the new rate. The duration may only change while no period is active.

use crate::error::{Result, StakeError};
use crate::events::PoolEvent;
use crate::math::Fixed;
use crate::pool::StakingPool;
use crate::token::Token;
use crate::types::AccountId;

impl<S: Token, R: Token> StakingPool<S, R> {
    /// Set the length of the next reward period
    pub fn set_rewards_duration(&mut self, caller: &AccountId, duration: u64, now: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        self.accumulator.set_duration(duration, now)?;

        self.record(PoolEvent::RewardsDurationUpdated {
            duration,
            timestamp: now,
        });

        tracing::info!(duration, "Rewards duration updated");
        Ok(())
    }

    /// Start or extend emission of `amount` reward over the configured duration.
    ///
    /// The reward must already sit in custody. Returns the new reward rate.
    ///
    /// Backing is checked against the whole reward balance held by custody,
    /// which includes rewards already owed but not yet claimed. Notifying
    /// again on an unchanged balance can therefore promise more than the pool
    /// can pay; fund custody before every notification.
    pub fn notify_reward_amount(&mut self, caller: &AccountId, amount: u128, now: u64) -> Result<Fixed> {
        self.ensure_owner(caller)?;

        let balance = self.rewards_token.balance_of(&self.custody);
        if balance < amount {
            return Err(StakeError::Underfunded { amount, balance });
        }

        let notified = self
            .total_reward_notified
            .checked_add(amount)
            .ok_or(StakeError::Overflow)?;
        let rate = self.accumulator.start_period(amount, now, balance)?;
        self.total_reward_notified = notified;

        let period_finish = self.accumulator.period_finish();
        self.record(PoolEvent::RewardAdded {
            amount,
            reward_rate: rate,
            period_finish,
            timestamp: now,
        });

        tracing::info!(
            amount,
            reward_rate = %rate,
            period_finish,
            token = self.rewards_token.symbol(),
            "Reward period started"
        );
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::PeriodStatus;
    use crate::config::PoolConfig;
    use crate::token::InMemoryToken;

    fn pool(funding: u128) -> StakingPool<InMemoryToken, InMemoryToken> {
        let mut pool = StakingPool::from_config(
            &PoolConfig {
                rewards_duration: 1_000,
                ..PoolConfig::default()
            },
            InMemoryToken::new("USDT", 18),
            InMemoryToken::new("TTT", 18),
        )
        .unwrap();
        let custody = pool.custody();
        pool.rewards_token_mut().mint(&custody, funding).unwrap();
        pool
    }

    #[test]
    fn test_only_owner_configures() {
        let mut pool = pool(1_000);
        let mallory = AccountId::from_label("mallory");

        assert!(matches!(
            pool.notify_reward_amount(&mallory, 1_000, 0),
            Err(StakeError::Unauthorized { .. })
        ));
        assert!(matches!(
            pool.set_rewards_duration(&mallory, 10, 0),
            Err(StakeError::Unauthorized { .. })
        ));
        assert_eq!(pool.period_status(0), PeriodStatus::Idle);
    }

    #[test]
    fn test_notify_starts_period() {
        let mut pool = pool(1_000);
        let owner = pool.owner();

        let rate = pool.notify_reward_amount(&owner, 1_000, 5).unwrap();
        assert_eq!(rate, Fixed::from_int(1));
        assert_eq!(pool.period_finish(), 1_005);
        assert_eq!(pool.period_status(5), PeriodStatus::Active);
        assert_eq!(pool.period_status(1_005), PeriodStatus::Expired);
        assert_eq!(pool.reward_for_duration().unwrap(), 1_000);
        assert_eq!(pool.total_reward_notified(), 1_000);
    }

    #[test]
    fn test_notify_unfunded_rejected() {
        let mut pool = pool(999);
        let owner = pool.owner();
        assert_eq!(
            pool.notify_reward_amount(&owner, 1_000, 0),
            Err(StakeError::Underfunded { amount: 1_000, balance: 999 })
        );
        assert_eq!(pool.total_reward_notified(), 0);
    }

    #[test]
    fn test_rollover_must_be_backed() {
        let mut pool = pool(1_200);
        let owner = pool.owner();
        pool.notify_reward_amount(&owner, 1_000, 0).unwrap();

        // 500 still unissued at t=500, so 1_000 more needs 1_500 in custody
        assert_eq!(
            pool.notify_reward_amount(&owner, 1_000, 500),
            Err(StakeError::RewardTooHigh { required: 1_500, balance: 1_200 })
        );
        assert_eq!(pool.period_finish(), 1_000);
        assert_eq!(pool.reward_rate(), Fixed::from_int(1));
        assert_eq!(pool.total_reward_notified(), 1_000);
    }

    #[test]
    fn test_owed_rewards_count_as_backing() {
        let mut pool = pool(1_000);
        let owner = pool.owner();
        let alice = AccountId::from_label("alice");
        let custody = pool.custody();
        pool.staking_token_mut().mint(&alice, 1).unwrap();
        pool.staking_token_mut().approve(&alice, &custody, 1);

        pool.notify_reward_amount(&owner, 1_000, 0).unwrap();
        pool.stake(&alice, 1, 0).unwrap();

        // the full period is owed to alice, yet the same balance backs a new one
        pool.notify_reward_amount(&owner, 1_000, 1_000).unwrap();
        assert_eq!(pool.earned(&alice, 1_000).unwrap(), 1_000);
        assert_eq!(pool.total_reward_notified(), 2_000);
        assert_eq!(pool.rewards_token().balance_of(&custody), 1_000);
    }

    #[test]
    fn test_duration_change_between_periods() {
        let mut pool = pool(1_000);
        let owner = pool.owner();
        pool.set_rewards_duration(&owner, 2_000, 0).unwrap();
        pool.notify_reward_amount(&owner, 1_000, 0).unwrap();

        assert_eq!(
            pool.set_rewards_duration(&owner, 500, 1_999),
            Err(StakeError::PeriodActive { finish: 2_000 })
        );
        pool.set_rewards_duration(&owner, 500, 2_000).unwrap();
        assert_eq!(pool.duration(), 500);

        let events = pool.drain_events();
        assert_eq!(events.len(), 3);
        assert!(pool.drain_events().is_empty());
    }
}
