//! # Participant Ledger
//!
//! Per-participant balances and reward snapshots.
//!
//! ```text
//! pending = balance × (rpt − rpt_paid)      (truncated)
//! earned  = rewards + pending
//! ```
//!
//! Settling books `pending` into `rewards` and moves the snapshot to the
//! current accumulator value, so only the accrual since the previous
//! settlement is ever attributed to the current balance.

use crate::accumulator::RewardAccumulator;
use crate::error::{Result, StakeError};
use crate::math::Fixed;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ledger entry for one participant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Staked principal
    pub(crate) balance: u128,

    /// Accumulator value at the last settlement
    pub(crate) reward_per_token_paid: Fixed,

    /// Settled, unclaimed reward
    pub(crate) rewards: u128,

    /// Lifetime reward paid out
    pub(crate) total_claimed: u128,
}

impl LedgerEntry {
    pub fn balance(&self) -> u128 {
        self.balance
    }

    pub fn reward_per_token_paid(&self) -> Fixed {
        self.reward_per_token_paid
    }

    /// Settled, unclaimed reward
    pub fn rewards(&self) -> u128 {
        self.rewards
    }

    pub fn total_claimed(&self) -> u128 {
        self.total_claimed
    }

    /// Reward accrued since the last settlement
    pub fn pending(&self, reward_per_token: Fixed) -> Result<u128> {
        let delta = reward_per_token.checked_sub(self.reward_per_token_paid)?;
        delta.mul_floor(self.balance)
    }

    /// Total claimable reward as of `reward_per_token`
    pub fn earned(&self, reward_per_token: Fixed) -> Result<u128> {
        self.rewards
            .checked_add(self.pending(reward_per_token)?)
            .ok_or(StakeError::Overflow)
    }

    /// Book pending reward and advance the snapshot
    pub fn settle(&mut self, reward_per_token: Fixed) -> Result<u128> {
        let delta = self.pending(reward_per_token)?;
        self.rewards = self.rewards.checked_add(delta).ok_or(StakeError::Overflow)?;
        self.reward_per_token_paid = reward_per_token;
        Ok(delta)
    }

    /// Zero the settled reward and return it
    pub fn take_rewards(&mut self) -> Result<u128> {
        let amount = self.rewards;
        self.rewards = 0;
        self.total_claimed = self
            .total_claimed
            .checked_add(amount)
            .ok_or(StakeError::Overflow)?;
        Ok(amount)
    }

    pub fn deposit(&mut self, amount: u128) -> Result<()> {
        self.balance = self.balance.checked_add(amount).ok_or(StakeError::Overflow)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: u128) -> Result<()> {
        if amount > self.balance {
            return Err(StakeError::InsufficientStake {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// No stake and nothing owed
    pub fn is_inert(&self) -> bool {
        self.balance == 0 && self.rewards == 0
    }
}

/// Ledger of all participants; absent entries read as zeroed
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticipantLedger {
    entries: HashMap<AccountId, LedgerEntry>,
}

impl ParticipantLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `account`, zeroed if never seen
    pub fn get(&self, account: &AccountId) -> LedgerEntry {
        self.entries.get(account).copied().unwrap_or_default()
    }

    /// Store a staged entry
    pub fn commit(&mut self, account: AccountId, entry: LedgerEntry) {
        self.entries.insert(account, entry);
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.get(account).balance
    }

    /// Refresh the accumulator, then book the participant's accrual
    pub fn settle(
        &mut self,
        account: &AccountId,
        accumulator: &mut RewardAccumulator,
        now: u64,
    ) -> Result<u128> {
        let rpt = accumulator.refresh(now)?;
        let mut entry = self.get(account);
        let delta = entry.settle(rpt)?;
        self.commit(*account, entry);

        tracing::debug!(%account, delta, rewards = entry.rewards, "Participant settled");
        Ok(delta)
    }

    /// What `settle` would leave claimable, without mutating anything
    pub fn earned(
        &self,
        account: &AccountId,
        accumulator: &RewardAccumulator,
        now: u64,
    ) -> Result<u128> {
        let rpt = accumulator.reward_per_token(now)?;
        self.get(account).earned(rpt)
    }

    /// Settle, then zero and return the settled reward
    pub fn claim(
        &mut self,
        account: &AccountId,
        accumulator: &mut RewardAccumulator,
        now: u64,
    ) -> Result<u128> {
        self.settle(account, accumulator, now)?;
        let mut entry = self.get(account);
        let amount = entry.take_rewards()?;
        self.commit(*account, entry);
        Ok(amount)
    }

    /// Number of participants ever seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Sum of all balances, for auditing against `total_staked`
    pub fn total_balance(&self) -> u128 {
        self.entries.values().map(|e| e.balance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    #[test]
    fn test_absent_entry_is_zeroed() {
        let ledger = ParticipantLedger::new();
        assert_eq!(ledger.get(&alice()), LedgerEntry::default());
        assert!(ledger.get(&alice()).is_inert());
    }

    #[test]
    fn test_pending_uses_only_delta() {
        let entry = LedgerEntry {
            balance: 1_000,
            reward_per_token_paid: Fixed::from_int(2),
            rewards: 50,
            total_claimed: 0,
        };
        assert_eq!(entry.pending(Fixed::from_int(3)).unwrap(), 1_000);
        assert_eq!(entry.earned(Fixed::from_int(3)).unwrap(), 1_050);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut entry = LedgerEntry {
            balance: 7,
            ..LedgerEntry::default()
        };
        let rpt = Fixed::from_ratio(10, 3).unwrap();
        assert_eq!(entry.settle(rpt).unwrap(), 23);
        assert_eq!(entry.settle(rpt).unwrap(), 0);
        assert_eq!(entry.rewards, 23);
    }

    #[test]
    fn test_take_rewards_tracks_claimed() {
        let mut entry = LedgerEntry {
            rewards: 40,
            ..LedgerEntry::default()
        };
        assert_eq!(entry.take_rewards().unwrap(), 40);
        assert_eq!(entry.take_rewards().unwrap(), 0);
        assert_eq!(entry.total_claimed, 40);
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut entry = LedgerEntry {
            balance: 5,
            ..LedgerEntry::default()
        };
        assert_eq!(
            entry.withdraw(6),
            Err(StakeError::InsufficientStake { requested: 6, available: 5 })
        );
        assert_eq!(entry.balance, 5);
    }

    #[test]
    fn test_ledger_settle_and_claim() {
        let mut acc = RewardAccumulator::new(100);
        acc.start_period(100, 0, 100).unwrap();

        let mut ledger = ParticipantLedger::new();
        ledger.settle(&alice(), &mut acc, 0).unwrap();
        let mut entry = ledger.get(&alice());
        entry.deposit(10).unwrap();
        acc.increase_stake(10).unwrap();
        ledger.commit(alice(), entry);

        assert_eq!(ledger.earned(&alice(), &acc, 40).unwrap(), 40);
        assert_eq!(ledger.claim(&alice(), &mut acc, 40).unwrap(), 40);
        assert_eq!(ledger.earned(&alice(), &acc, 40).unwrap(), 0);
        assert_eq!(ledger.get(&alice()).total_claimed, 40);
        assert_eq!(ledger.total_balance(), acc.total_staked());
    }
}
