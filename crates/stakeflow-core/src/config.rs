//! Pool configuration types

use crate::constants::DEFAULT_REWARDS_DURATION;
use crate::error::{Result, StakeError};
use crate::types::AccountId;
use serde::{Deserialize, Serialize};

/// Complete pool configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Label of the distributor account allowed to configure periods
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Label of the account holding staked principal and reward funds
    #[serde(default = "default_custody")]
    pub custody: String,

    /// Reward period length in seconds
    #[serde(default = "default_rewards_duration")]
    pub rewards_duration: u64,

    /// Principal asset
    #[serde(default = "default_staking_token")]
    pub staking_token: TokenConfig,

    /// Reward asset
    #[serde(default = "default_reward_token")]
    pub reward_token: TokenConfig,
}

/// Token descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_custody() -> String {
    "pool".to_string()
}

fn default_rewards_duration() -> u64 {
    DEFAULT_REWARDS_DURATION
}

fn default_decimals() -> u8 {
    18
}

fn default_staking_token() -> TokenConfig {
    TokenConfig {
        symbol: "USDT".to_string(),
        decimals: default_decimals(),
    }
}

fn default_reward_token() -> TokenConfig {
    TokenConfig {
        symbol: "TTT".to_string(),
        decimals: default_decimals(),
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            custody: default_custody(),
            rewards_duration: default_rewards_duration(),
            staking_token: default_staking_token(),
            reward_token: default_reward_token(),
        }
    }
}

impl PoolConfig {
    /// Parse from TOML, filling missing fields with defaults
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn owner_id(&self) -> AccountId {
        AccountId::from_label(&self.owner)
    }

    pub fn custody_id(&self) -> AccountId {
        AccountId::from_label(&self.custody)
    }

    /// Reject configurations the pool cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.rewards_duration == 0 {
            return Err(StakeError::ZeroDuration);
        }
        Ok(())
    }
}
