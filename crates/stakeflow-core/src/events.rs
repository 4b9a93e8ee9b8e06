//! Pool events
//!
//! Every committed operation appends one event. Embedders drain the log to
//! index activity off the hot path.

use crate::math::Fixed;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};

/// Event emitted by a committed pool operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Principal deposited
    Staked {
        account: AccountId,
        amount: u128,
        timestamp: u64,
    },

    /// Principal returned
    Withdrawn {
        account: AccountId,
        amount: u128,
        timestamp: u64,
    },

    /// Reward paid out
    RewardPaid {
        account: AccountId,
        reward: u128,
        timestamp: u64,
    },

    /// New reward period started or extended
    RewardAdded {
        amount: u128,
        reward_rate: Fixed,
        period_finish: u64,
        timestamp: u64,
    },

    /// Period duration changed
    RewardsDurationUpdated { duration: u64, timestamp: u64 },
}

impl PoolEvent {
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Staked { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::RewardPaid { timestamp, .. }
            | Self::RewardAdded { timestamp, .. }
            | Self::RewardsDurationUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize for indexing
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
