//! # Stakeflow Core - Time-Weighted Reward Distribution
//!
//! Participants stake a principal token into a shared pool and earn a
//! proportional share of a fixed reward released linearly over a
//! distribution period.
//!
//! ## Key Features
//!
//! - **O(1) accrual**: a single reward-per-token accumulator replaces any
//!   per-participant loop
//! - **Lazy settlement**: a participant's share is recomputed only when their
//!   balance changes or they claim
//! - **Exact fixed-point math**: 256-bit intermediates, multiply before divide,
//!   rounding always in favour of the pool
//! - **All-or-nothing operations**: state is staged and committed only after
//!   every token transfer succeeded
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`math`] | Fixed-point arithmetic |
//! | [`accumulator`] | Pool-wide reward per token, period state |
//! | [`ledger`] | Per-participant balances and snapshots |
//! | [`vault`] | stake / withdraw / get_reward / exit |
//! | [`distributor`] | set_rewards_duration / notify_reward_amount |
//! | [`pool`] | The aggregate owning all of the above |
//!
//! ## Example
//!
//! ```text
//! 30,000 TTT over 30 days = 1,000 TTT/day
//! A stakes 90 USDT, B stakes 10 USDT, one day passes
//! earned(A) ≈ 900 TTT, earned(B) ≈ 100 TTT
//! ```

pub mod accumulator;
pub mod config;
pub mod distributor;
pub mod error;
pub mod events;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod token;
pub mod types;
pub mod vault;

// Re-exports
pub use accumulator::{PeriodStatus, RewardAccumulator};
pub use config::{PoolConfig, TokenConfig};
pub use error::{ErrorKind, Result, StakeError};
pub use events::PoolEvent;
pub use ledger::{LedgerEntry, ParticipantLedger};
pub use math::Fixed;
pub use pool::{SharedPool, StakingPool};
pub use token::{InMemoryToken, Token, TokenError};
pub use types::AccountId;

/// Pool constants
pub mod constants {
    /// Fixed-point scale: 18 decimal places
    pub const PRECISION: u128 = 1_000_000_000_000_000_000; // 10^18

    /// Seconds in one day
    pub const SECONDS_PER_DAY: u64 = 86_400;

    /// Default reward period: 30 days
    pub const DEFAULT_REWARDS_DURATION: u64 = 30 * SECONDS_PER_DAY;
}

pub use constants::*;
