//! # Reward Accumulator
//!
//! Pool-wide accrual state. Instead of crediting every participant on every
//! tick, the pool tracks one number: the reward earned by a single staked
//! unit held since inception.
//!
//! ```text
//! applicable = min(now, period_finish)
//! rpt       += rate × (applicable − last_update) / total_staked
//! last_update = applicable
//! ```
//!
//! ## Period Lifecycle
//!
//! | Status | Condition | Emission |
//! |--------|-----------|----------|
//! | Idle | no period ever started | none |
//! | Active | `now < period_finish` | `reward_rate` per second |
//! | Expired | `now >= period_finish` | none, recoverable by a new period |
//!
//! While `total_staked` is zero the clock still advances, so reward emitted
//! into an empty pool is never distributed.

use crate::error::{Result, StakeError};
use crate::math::Fixed;
use serde::{Deserialize, Serialize};

/// Distribution period state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    /// No reward period has been configured yet
    Idle,
    /// Rewards are emitting
    Active,
    /// The last period ended; accrual is capped at its finish
    Expired,
}

/// Pool-wide reward accrual state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccumulator {
    /// Sum of all participant balances
    total_staked: u128,

    /// Reward units emitted per second
    reward_rate: Fixed,

    /// Length of the next reward period in seconds
    duration: u64,

    /// End of the current period
    period_finish: u64,

    /// Instant through which `reward_per_token_stored` is current
    last_update_time: u64,

    /// Cumulative reward per staked unit
    reward_per_token_stored: Fixed,
}

impl RewardAccumulator {
    /// Create an idle accumulator with the given period duration
    pub fn new(duration: u64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn reward_rate(&self) -> Fixed {
        self.reward_rate
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn period_finish(&self) -> u64 {
        self.period_finish
    }

    pub fn last_update_time(&self) -> u64 {
        self.last_update_time
    }

    /// Accumulator value as of the last refresh
    pub fn reward_per_token_stored(&self) -> Fixed {
        self.reward_per_token_stored
    }

    /// Emission never counts past the period end
    pub fn last_time_applicable(&self, now: u64) -> u64 {
        now.min(self.period_finish)
    }

    /// Accumulator value as of `now`, without mutating state
    pub fn reward_per_token(&self, now: u64) -> Result<Fixed> {
        if self.total_staked == 0 {
            return Ok(self.reward_per_token_stored);
        }

        let elapsed = self
            .last_time_applicable(now)
            .saturating_sub(self.last_update_time);
        let delta = self.reward_rate.accrue(elapsed, self.total_staked)?;

        self.reward_per_token_stored.checked_add(delta)
    }

    /// Bring the accumulator up to `now` and return the refreshed value
    pub fn refresh(&mut self, now: u64) -> Result<Fixed> {
        let rpt = self.reward_per_token(now)?;
        let applicable = self.last_time_applicable(now);

        self.reward_per_token_stored = rpt;
        // an earlier `now` accrues nothing and never rewinds the clock
        self.last_update_time = self.last_update_time.max(applicable);

        tracing::debug!(
            now,
            last_update_time = self.last_update_time,
            total_staked = self.total_staked,
            reward_per_token = %rpt,
            "Accumulator refreshed"
        );

        Ok(rpt)
    }

    /// Current state of the distribution period
    pub fn status(&self, now: u64) -> PeriodStatus {
        if self.period_finish == 0 {
            PeriodStatus::Idle
        } else if now < self.period_finish {
            PeriodStatus::Active
        } else {
            PeriodStatus::Expired
        }
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.status(now) == PeriodStatus::Active
    }

    /// Reward scheduled but not yet emitted
    pub fn remaining_rewards(&self, now: u64) -> Result<u128> {
        if !self.is_active(now) {
            return Ok(0);
        }
        let remaining = u128::from(self.period_finish - now);
        self.reward_rate.mul_floor(remaining)
    }

    /// Total emission of one full period at the current rate
    pub fn reward_for_duration(&self) -> Result<u128> {
        self.reward_rate.mul_floor(u128::from(self.duration))
    }

    /// Change the period duration; only allowed between periods
    pub fn set_duration(&mut self, duration: u64, now: u64) -> Result<()> {
        if duration == 0 {
            return Err(StakeError::ZeroDuration);
        }
        if self.is_active(now) {
            return Err(StakeError::PeriodActive {
                finish: self.period_finish,
            });
        }

        self.duration = duration;
        Ok(())
    }

    /// Begin a new reward period emitting `amount` plus any unissued remainder.
    ///
    /// `custody_balance` is the reward token balance held by the pool; the
    /// period is rejected if its full emission could not be paid from it.
    /// On error the accumulator is left untouched. A `now` earlier than the
    /// last update is treated as the last update.
    pub fn start_period(&mut self, amount: u128, now: u64, custody_balance: u128) -> Result<Fixed> {
        if self.duration == 0 {
            return Err(StakeError::ZeroDuration);
        }
        let now = now.max(self.last_update_time);

        let mut next = self.clone();
        next.refresh(now)?;

        let carried = self.remaining_rewards(now)?;
        let total = amount.checked_add(carried).ok_or(StakeError::Overflow)?;
        let rate = Fixed::from_ratio(total, u128::from(self.duration))?;

        if rate.is_zero() {
            return Err(StakeError::ZeroRewardRate);
        }

        let required = rate.mul_floor(u128::from(self.duration))?;
        if required > custody_balance {
            return Err(StakeError::RewardTooHigh {
                required,
                balance: custody_balance,
            });
        }

        next.reward_rate = rate;
        next.last_update_time = now;
        next.period_finish = now.checked_add(self.duration).ok_or(StakeError::Overflow)?;
        *self = next;

        tracing::debug!(
            amount,
            carried,
            reward_rate = %rate,
            period_finish = self.period_finish,
            "Reward period started"
        );

        Ok(rate)
    }

    /// Record new stake; callers refresh first
    pub fn increase_stake(&mut self, amount: u128) -> Result<()> {
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakeError::Overflow)?;
        Ok(())
    }

    /// Record withdrawn stake; callers refresh first
    pub fn decrease_stake(&mut self, amount: u128) -> Result<()> {
        self.total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(StakeError::InsufficientStake {
                requested: amount,
                available: self.total_staked,
            })?;
        Ok(())
    }
}
