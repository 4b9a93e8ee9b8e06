//! # Staking Vault
//!
//! Participant-facing operations: deposit and withdraw principal, claim
//! reward, or do both at once with `exit`.
//!
//! Each operation settles the participant against the refreshed
//! accumulator before touching the balance, so accrual up to `now` is
//! attributed to the balance held before the change.

use crate::error::{Result, StakeError};
use crate::events::PoolEvent;
use crate::pool::StakingPool;
use crate::token::Token;
use crate::types::AccountId;

impl<S: Token, R: Token> StakingPool<S, R> {
    /// Deposit `amount` of principal from `account` into custody.
    ///
    /// `account` must have approved the custody account for `amount`.
    pub fn stake(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }

        let mut settlement = self.stage(account, now)?;
        settlement.entry.deposit(amount)?;
        settlement.accumulator.increase_stake(amount)?;

        let custody = self.custody;
        if let Err(e) = self
            .staking_token
            .transfer_from(&custody, account, &custody, amount)
        {
            tracing::warn!(%account, amount, error = %e, "Stake aborted: transfer failed");
            return Err(e.into());
        }

        self.commit(
            settlement,
            PoolEvent::Staked {
                account: *account,
                amount,
                timestamp: now,
            },
        );

        tracing::info!(%account, amount, total_staked = self.total_staked(), "Staked");
        Ok(())
    }

    /// Return `amount` of principal from custody to `account`
    pub fn withdraw(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let available = self.balance_of(account);
        if amount > available {
            return Err(StakeError::InsufficientStake {
                requested: amount,
                available,
            });
        }

        let mut settlement = self.stage(account, now)?;
        settlement.entry.withdraw(amount)?;
        settlement.accumulator.decrease_stake(amount)?;

        let custody = self.custody;
        if let Err(e) = self.staking_token.transfer(&custody, account, amount) {
            tracing::warn!(%account, amount, error = %e, "Withdraw aborted: transfer failed");
            return Err(e.into());
        }

        self.commit(
            settlement,
            PoolEvent::Withdrawn {
                account: *account,
                amount,
                timestamp: now,
            },
        );

        tracing::info!(%account, amount, total_staked = self.total_staked(), "Withdrawn");
        Ok(())
    }

    /// Pay out everything `account` has earned; zero is a no-op, not an error
    pub fn get_reward(&mut self, account: &AccountId, now: u64) -> Result<u128> {
        let mut settlement = self.stage(account, now)?;
        let reward = settlement.entry.take_rewards()?;

        if reward == 0 {
            // keep the settled snapshot; nothing to pay
            self.accumulator = settlement.accumulator;
            self.ledger.commit(settlement.account, settlement.entry);
            return Ok(0);
        }

        let paid = self
            .total_reward_paid
            .checked_add(reward)
            .ok_or(StakeError::Overflow)?;

        let custody = self.custody;
        if let Err(e) = self.rewards_token.transfer(&custody, account, reward) {
            tracing::warn!(%account, reward, error = %e, "Claim aborted: transfer failed");
            return Err(e.into());
        }

        self.total_reward_paid = paid;
        self.commit(
            settlement,
            PoolEvent::RewardPaid {
                account: *account,
                reward,
                timestamp: now,
            },
        );

        tracing::info!(%account, reward, "Reward paid");
        Ok(reward)
    }

    /// Withdraw the full balance and claim in one operation; returns the reward paid.
    ///
    /// Both transfers must succeed. If the reward transfer fails the principal
    /// is moved back into custody and nothing is committed. Should that return
    /// also fail, only the withdrawal is booked and the reward stays owed.
    pub fn exit(&mut self, account: &AccountId, now: u64) -> Result<u128> {
        let balance = self.balance_of(account);
        if balance == 0 {
            return Err(StakeError::ZeroAmount);
        }

        let mut withdrawn = self.stage(account, now)?;
        withdrawn.entry.withdraw(balance)?;
        withdrawn.accumulator.decrease_stake(balance)?;

        let mut settlement = withdrawn.clone();
        let reward = settlement.entry.take_rewards()?;
        let paid = self
            .total_reward_paid
            .checked_add(reward)
            .ok_or(StakeError::Overflow)?;

        let custody = self.custody;
        if let Err(e) = self.staking_token.transfer(&custody, account, balance) {
            tracing::warn!(%account, balance, error = %e, "Exit aborted: transfer failed");
            return Err(e.into());
        }

        if reward > 0 {
            if let Err(e) = self.rewards_token.transfer(&custody, account, reward) {
                tracing::warn!(%account, reward, error = %e, "Exit aborted: reward transfer failed");

                if let Err(undo) = self.staking_token.transfer(account, &custody, balance) {
                    // principal already left custody; book the withdrawal, keep the reward owed
                    tracing::error!(%account, balance, error = %undo, "Exit principal not returned");
                    self.commit(
                        withdrawn,
                        PoolEvent::Withdrawn {
                            account: *account,
                            amount: balance,
                            timestamp: now,
                        },
                    );
                }
                return Err(e.into());
            }
        }

        self.total_reward_paid = paid;
        self.commit(
            settlement,
            PoolEvent::Withdrawn {
                account: *account,
                amount: balance,
                timestamp: now,
            },
        );
        if reward > 0 {
            self.record(PoolEvent::RewardPaid {
                account: *account,
                reward,
                timestamp: now,
            });
        }

        tracing::info!(%account, balance, reward, total_staked = self.total_staked(), "Exited");
        Ok(reward)
    }
}
