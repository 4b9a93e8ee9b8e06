//! # Staking Pool
//!
//! The aggregate that owns all reward accounting state: the pool-wide
//! [`RewardAccumulator`], the [`ParticipantLedger`], both token
//! collaborators, and the event log.
//!
//! Every state-changing operation follows the same protocol:
//!
//! ```text
//! stage    copy accumulator + entry, refresh, settle
//! mutate   apply the balance change to the copies
//! transfer move tokens through the collaborator
//! commit   write the copies back (skipped if any step failed)
//! ```
//!
//! so a rejected operation leaves the pool exactly as it found it.
//! Operations live in [`crate::vault`] and [`crate::distributor`].

use crate::accumulator::{PeriodStatus, RewardAccumulator};
use crate::config::PoolConfig;
use crate::error::{Result, StakeError};
use crate::events::PoolEvent;
use crate::ledger::{LedgerEntry, ParticipantLedger};
use crate::math::Fixed;
use crate::token::Token;
use crate::types::AccountId;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Staged copies of the state touched by one operation
#[derive(Clone, Debug)]
pub(crate) struct Settlement {
    pub account: AccountId,
    pub accumulator: RewardAccumulator,
    pub entry: LedgerEntry,
}

/// Reward pool over a principal token `S` and a reward token `R`
pub struct StakingPool<S: Token, R: Token> {
    /// Distributor role
    owner: AccountId,

    /// Account holding principal and reward funds
    pub(crate) custody: AccountId,

    pub(crate) accumulator: RewardAccumulator,
    pub(crate) ledger: ParticipantLedger,

    pub(crate) staking_token: S,
    pub(crate) rewards_token: R,

    /// Sum of every accepted reward notification
    pub(crate) total_reward_notified: u128,

    /// Sum of every reward payout
    pub(crate) total_reward_paid: u128,

    events: Vec<PoolEvent>,
}

impl<S: Token, R: Token> StakingPool<S, R> {
    /// Create an idle pool
    pub fn new(
        owner: AccountId,
        custody: AccountId,
        rewards_duration: u64,
        staking_token: S,
        rewards_token: R,
    ) -> Self {
        Self {
            owner,
            custody,
            accumulator: RewardAccumulator::new(rewards_duration),
            ledger: ParticipantLedger::new(),
            staking_token,
            rewards_token,
            total_reward_notified: 0,
            total_reward_paid: 0,
            events: Vec::new(),
        }
    }

    /// Create a pool from validated configuration
    pub fn from_config(config: &PoolConfig, staking_token: S, rewards_token: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.owner_id(),
            config.custody_id(),
            config.rewards_duration,
            staking_token,
            rewards_token,
        ))
    }

    // === Views ===

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn custody(&self) -> AccountId {
        self.custody
    }

    pub fn accumulator(&self) -> &RewardAccumulator {
        &self.accumulator
    }

    pub fn ledger(&self) -> &ParticipantLedger {
        &self.ledger
    }

    pub fn total_staked(&self) -> u128 {
        self.accumulator.total_staked()
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.ledger.balance_of(account)
    }

    pub fn duration(&self) -> u64 {
        self.accumulator.duration()
    }

    pub fn period_finish(&self) -> u64 {
        self.accumulator.period_finish()
    }

    pub fn reward_rate(&self) -> Fixed {
        self.accumulator.reward_rate()
    }

    pub fn period_status(&self, now: u64) -> PeriodStatus {
        self.accumulator.status(now)
    }

    pub fn last_time_reward_applicable(&self, now: u64) -> u64 {
        self.accumulator.last_time_applicable(now)
    }

    pub fn reward_per_token(&self, now: u64) -> Result<Fixed> {
        self.accumulator.reward_per_token(now)
    }

    /// Claimable reward of `account` as of `now`
    pub fn earned(&self, account: &AccountId, now: u64) -> Result<u128> {
        self.ledger.earned(account, &self.accumulator, now)
    }

    /// Total emission of one full period at the current rate
    pub fn reward_for_duration(&self) -> Result<u128> {
        self.accumulator.reward_for_duration()
    }

    pub fn total_reward_notified(&self) -> u128 {
        self.total_reward_notified
    }

    pub fn total_reward_paid(&self) -> u128 {
        self.total_reward_paid
    }

    pub fn staking_token(&self) -> &S {
        &self.staking_token
    }

    pub fn staking_token_mut(&mut self) -> &mut S {
        &mut self.staking_token
    }

    pub fn rewards_token(&self) -> &R {
        &self.rewards_token
    }

    pub fn rewards_token_mut(&mut self) -> &mut R {
        &mut self.rewards_token
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    // === Settlement protocol ===

    /// Refresh the accumulator and book `account`'s accrual
    pub fn settle(&mut self, account: &AccountId, now: u64) -> Result<u128> {
        self.ledger.settle(account, &mut self.accumulator, now)
    }

    /// Refresh and settle on copies; nothing is written until `commit`
    pub(crate) fn stage(&self, account: &AccountId, now: u64) -> Result<Settlement> {
        let mut accumulator = self.accumulator.clone();
        let mut entry = self.ledger.get(account);

        let rpt = accumulator.refresh(now)?;
        entry.settle(rpt)?;

        Ok(Settlement {
            account: *account,
            accumulator,
            entry,
        })
    }

    pub(crate) fn commit(&mut self, settlement: Settlement, event: PoolEvent) {
        self.accumulator = settlement.accumulator;
        self.ledger.commit(settlement.account, settlement.entry);
        self.events.push(event);
    }

    pub(crate) fn record(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub(crate) fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.owner {
            return Err(StakeError::Unauthorized { caller: *caller });
        }
        Ok(())
    }
}

/// Thread-safe handle serializing every operation on one pool.
///
/// The whole `refresh → settle → mutate → transfer` sequence runs under a
/// single lock, so no intermediate state is ever observable.
pub struct SharedPool<S: Token, R: Token> {
    inner: Arc<Mutex<StakingPool<S, R>>>,
}

impl<S: Token, R: Token> Clone for SharedPool<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Token, R: Token> SharedPool<S, R> {
    pub fn new(pool: StakingPool<S, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Lock the pool for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, StakingPool<S, R>> {
        self.inner.lock()
    }

    pub fn stake(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.inner.lock().stake(account, amount, now)
    }

    pub fn withdraw(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.inner.lock().withdraw(account, amount, now)
    }

    pub fn get_reward(&self, account: &AccountId, now: u64) -> Result<u128> {
        self.inner.lock().get_reward(account, now)
    }

    pub fn exit(&self, account: &AccountId, now: u64) -> Result<u128> {
        self.inner.lock().exit(account, now)
    }

    pub fn earned(&self, account: &AccountId, now: u64) -> Result<u128> {
        self.inner.lock().earned(account, now)
    }
}
