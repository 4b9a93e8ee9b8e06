//! Error types for reward pool operations

use crate::token::TokenError;
use crate::types::AccountId;
use thiserror::Error;

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, StakeError>;

/// Broad error category, used by callers to decide whether to retry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any state change
    Validation,
    /// Caller lacks the distributor role
    Authorization,
    /// External token movement failed
    Transfer,
    /// Reward period would promise more than custody holds
    Configuration,
    /// Fixed-point arithmetic left its representable range
    Arithmetic,
}

/// Errors that can occur in reward pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    // === Validation ===
    /// Stake, withdraw and reward amounts must be positive
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Withdrawal exceeds the participant's staked balance
    #[error("Insufficient stake: requested {requested}, available {available}")]
    InsufficientStake { requested: u128, available: u128 },

    /// Reward period duration must be positive
    #[error("Rewards duration must be greater than zero")]
    ZeroDuration,

    /// Duration can only change between periods
    #[error("Reward period still active until {finish}")]
    PeriodActive { finish: u64 },

    // === Authorization ===
    /// Admin action from an account other than the owner
    #[error("Caller {caller} is not the pool owner")]
    Unauthorized { caller: AccountId },

    // === Transfer ===
    /// Token collaborator refused a transfer
    #[error("Token transfer failed: {0}")]
    Transfer(#[from] TokenError),

    // === Configuration ===
    /// Reward amount is not held in custody
    #[error("Reward amount {amount} not funded: custody holds {balance}")]
    Underfunded { amount: u128, balance: u128 },

    /// rate * duration would exceed the reward balance in custody
    #[error("Reward schedule needs {required} but custody holds {balance}")]
    RewardTooHigh { required: u128, balance: u128 },

    /// The new period would emit nothing
    #[error("Reward rate would be zero")]
    ZeroRewardRate,

    // === Arithmetic ===
    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Division by a zero denominator
    #[error("Division by zero")]
    DivisionByZero,
}

impl StakeError {
    /// Get the error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::InsufficientStake { .. }
            | Self::ZeroDuration
            | Self::PeriodActive { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Transfer(_) => ErrorKind::Transfer,
            Self::Underfunded { .. } | Self::RewardTooHigh { .. } | Self::ZeroRewardRate => {
                ErrorKind::Configuration
            }
            Self::Overflow | Self::DivisionByZero => ErrorKind::Arithmetic,
        }
    }

    /// Check if the caller can retry with corrected input or funds
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Transfer)
    }
}
