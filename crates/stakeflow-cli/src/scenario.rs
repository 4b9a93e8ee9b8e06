//! Scenario files: a pool configuration plus a timeline of actions
//!
//! ```toml
//! start = 1700000000
//!
//! [pool]
//! rewards_duration = 2592000
//!
//! [[steps]]
//! at = 0
//! action = "mint"
//! token = "reward"
//! account = "pool"
//! amount = "30000"
//! ```
//!
//! Amounts are decimal strings in whole tokens; `at` is seconds after `start`.

use crate::units::{format_units, parse_units};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use stakeflow_core::{
    AccountId, InMemoryToken, PeriodStatus, PoolConfig, PoolEvent, StakingPool, Token,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Which of the pool's two tokens an action refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Staking,
    Reward,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Mint {
        token: Asset,
        account: String,
        amount: String,
    },
    Approve {
        account: String,
        amount: String,
    },
    Stake {
        account: String,
        amount: String,
    },
    Withdraw {
        account: String,
        amount: String,
    },
    Claim {
        account: String,
    },
    Exit {
        account: String,
    },
    Notify {
        account: String,
        amount: String,
    },
    SetDuration {
        account: String,
        seconds: u64,
    },
    /// Assert `earned(account)` within `tolerance` (default zero)
    Expect {
        account: String,
        earned: String,
        #[serde(default)]
        tolerance: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Seconds after the scenario start
    #[serde(default)]
    pub at: u64,

    #[serde(flatten)]
    pub action: Action,
}

/// A complete scenario file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Unix time of `at = 0`; defaults to now
    #[serde(default)]
    pub start: Option<u64>,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid scenario file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario {:?}", path))?;
        Self::from_toml_str(&content)
    }
}

/// Result of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub at: u64,
    pub action: Action,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state of one participant
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub account: String,
    pub id: AccountId,
    pub staked: String,
    pub earned: String,
    pub claimed: String,
    pub wallet_staking: String,
    pub wallet_reward: String,
}

/// Simulation report printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub start: u64,
    pub end: u64,
    pub period_status: PeriodStatus,
    pub period_finish: u64,
    pub total_staked: String,
    pub reward_per_token: String,
    pub total_reward_notified: String,
    pub total_reward_paid: String,
    pub participants: Vec<ParticipantReport>,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<PoolEvent>,
}

impl Report {
    /// Number of steps that failed
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

/// Replays a scenario against an in-memory pool
pub struct Runner {
    pool: StakingPool<InMemoryToken, InMemoryToken>,
    labels: BTreeMap<String, AccountId>,
    start: u64,
}

impl Runner {
    pub fn new(config: &PoolConfig, start: u64) -> anyhow::Result<Self> {
        let pool = StakingPool::from_config(
            config,
            InMemoryToken::from_config(&config.staking_token),
            InMemoryToken::from_config(&config.reward_token),
        )?;

        let mut labels = BTreeMap::new();
        labels.insert(config.owner.clone(), config.owner_id());
        labels.insert(config.custody.clone(), config.custody_id());

        Ok(Self {
            pool,
            labels,
            start,
        })
    }

    pub fn pool(&self) -> &StakingPool<InMemoryToken, InMemoryToken> {
        &self.pool
    }

    fn account(&mut self, label: &str) -> AccountId {
        *self
            .labels
            .entry(label.to_string())
            .or_insert_with(|| AccountId::from_label(label))
    }

    fn staking_units(&self, amount: &str) -> anyhow::Result<u128> {
        parse_units(amount, self.pool.staking_token().decimals())
    }

    fn reward_units(&self, amount: &str) -> anyhow::Result<u128> {
        parse_units(amount, self.pool.rewards_token().decimals())
    }

    fn reward_fmt(&self, amount: u128) -> String {
        format_units(amount, self.pool.rewards_token().decimals())
    }

    /// Execute one action at absolute time `now`
    pub fn apply(&mut self, action: &Action, now: u64) -> anyhow::Result<Option<String>> {
        match action {
            Action::Mint {
                token,
                account,
                amount,
            } => {
                let who = self.account(account);
                match token {
                    Asset::Staking => {
                        let units = self.staking_units(amount)?;
                        self.pool.staking_token_mut().mint(&who, units)?;
                    }
                    Asset::Reward => {
                        let units = self.reward_units(amount)?;
                        self.pool.rewards_token_mut().mint(&who, units)?;
                    }
                }
                Ok(None)
            }
            Action::Approve { account, amount } => {
                let who = self.account(account);
                let units = self.staking_units(amount)?;
                let custody = self.pool.custody();
                self.pool.staking_token_mut().approve(&who, &custody, units);
                Ok(None)
            }
            Action::Stake { account, amount } => {
                let who = self.account(account);
                let units = self.staking_units(amount)?;
                self.pool.stake(&who, units, now)?;
                Ok(None)
            }
            Action::Withdraw { account, amount } => {
                let who = self.account(account);
                let units = self.staking_units(amount)?;
                self.pool.withdraw(&who, units, now)?;
                Ok(None)
            }
            Action::Claim { account } => {
                let who = self.account(account);
                let paid = self.pool.get_reward(&who, now)?;
                Ok(Some(self.reward_fmt(paid)))
            }
            Action::Exit { account } => {
                let who = self.account(account);
                let paid = self.pool.exit(&who, now)?;
                Ok(Some(self.reward_fmt(paid)))
            }
            Action::Notify { account, amount } => {
                let who = self.account(account);
                let units = self.reward_units(amount)?;
                let rate = self.pool.notify_reward_amount(&who, units, now)?;
                Ok(Some(format!("rate {}", rate)))
            }
            Action::SetDuration { account, seconds } => {
                let who = self.account(account);
                self.pool.set_rewards_duration(&who, *seconds, now)?;
                Ok(None)
            }
            Action::Expect {
                account,
                earned,
                tolerance,
            } => {
                let who = self.account(account);
                let expected = self.reward_units(earned)?;
                let tolerance = match tolerance {
                    Some(t) => self.reward_units(t)?,
                    None => 0,
                };
                let actual = self.pool.earned(&who, now)?;
                if actual.abs_diff(expected) > tolerance {
                    bail!(
                        "{} earned {}, expected {}",
                        account,
                        self.reward_fmt(actual),
                        earned
                    );
                }
                Ok(Some(self.reward_fmt(actual)))
            }
        }
    }

    /// Run every step in time order; stops at the first failure when `strict`
    pub fn run(mut self, steps: &[Step], strict: bool) -> anyhow::Result<Report> {
        let mut ordered: Vec<&Step> = steps.iter().collect();
        ordered.sort_by_key(|s| s.at);

        let mut outcomes = Vec::with_capacity(ordered.len());
        let mut end = self.start;

        for step in ordered {
            let now = self.start.checked_add(step.at).context("step time overflows")?;
            end = now;

            let outcome = match self.apply(&step.action, now) {
                Ok(result) => StepOutcome {
                    at: step.at,
                    action: step.action.clone(),
                    ok: true,
                    result,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(at = step.at, error = %e, "Step failed");
                    if strict {
                        return Err(e.context(format!("step at +{}s failed", step.at)));
                    }
                    StepOutcome {
                        at: step.at,
                        action: step.action.clone(),
                        ok: false,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        self.report(end, outcomes)
    }

    fn report(mut self, end: u64, steps: Vec<StepOutcome>) -> anyhow::Result<Report> {
        let stake_decimals = self.pool.staking_token().decimals();
        let reward_decimals = self.pool.rewards_token().decimals();
        let custody = self.pool.custody();

        let mut participants = Vec::new();
        for (label, id) in &self.labels {
            if *id == custody {
                continue;
            }
            let entry = self.pool.ledger().get(id);
            participants.push(ParticipantReport {
                account: label.clone(),
                id: *id,
                staked: format_units(entry.balance(), stake_decimals),
                earned: format_units(self.pool.earned(id, end)?, reward_decimals),
                claimed: format_units(entry.total_claimed(), reward_decimals),
                wallet_staking: format_units(self.pool.staking_token().balance_of(id), stake_decimals),
                wallet_reward: format_units(self.pool.rewards_token().balance_of(id), reward_decimals),
            });
        }

        Ok(Report {
            start: self.start,
            end,
            period_status: self.pool.period_status(end),
            period_finish: self.pool.period_finish(),
            total_staked: format_units(self.pool.total_staked(), stake_decimals),
            reward_per_token: self.pool.reward_per_token(end)?.to_string(),
            total_reward_notified: format_units(self.pool.total_reward_notified(), reward_decimals),
            total_reward_paid: format_units(self.pool.total_reward_paid(), reward_decimals),
            participants,
            steps,
            events: self.pool.drain_events(),
        })
    }
}

/// Load, run and report a scenario
pub fn simulate(scenario: &Scenario, strict: bool) -> anyhow::Result<Report> {
    let start = scenario
        .start
        .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0));

    let runner = Runner::new(&scenario.pool, start)?;
    tracing::info!(
        start,
        steps = scenario.steps.len(),
        duration = runner.pool().duration(),
        "Running scenario"
    );
    runner.run(&scenario.steps, strict)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGGERED: &str = r#"
        start = 1000

        [pool]
        rewards_duration = 2592000

        [[steps]]
        action = "mint"
        token = "reward"
        account = "pool"
        amount = "30000"

        [[steps]]
        action = "notify"
        account = "owner"
        amount = "30000"

        [[steps]]
        action = "mint"
        token = "staking"
        account = "a"
        amount = "90"

        [[steps]]
        action = "approve"
        account = "a"
        amount = "90"

        [[steps]]
        action = "mint"
        token = "staking"
        account = "b"
        amount = "10"

        [[steps]]
        action = "approve"
        account = "b"
        amount = "10"

        [[steps]]
        action = "stake"
        account = "b"
        amount = "10"

        [[steps]]
        at = 43200
        action = "stake"
        account = "a"
        amount = "90"

        [[steps]]
        at = 86400
        action = "expect"
        account = "b"
        earned = "550"
        tolerance = "0.000001"

        [[steps]]
        at = 86400
        action = "exit"
        account = "a"
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(STAGGERED).unwrap();
        assert_eq!(scenario.start, Some(1_000));
        assert_eq!(scenario.steps.len(), 10);
        assert_eq!(
            scenario.steps[7].action,
            Action::Stake {
                account: "a".into(),
                amount: "90".into()
            }
        );
        assert_eq!(scenario.steps[7].at, 43_200);
    }

    #[test]
    fn test_staggered_scenario_report() {
        let scenario = Scenario::from_toml_str(STAGGERED).unwrap();
        let report = simulate(&scenario, true).unwrap();

        assert_eq!(report.failures(), 0);
        assert_eq!(report.end, 1_000 + 86_400);
        let a = report.participants.iter().find(|p| p.account == "a").unwrap();
        assert_eq!(a.staked, "0");
        assert_eq!(a.earned, "0");
        assert!(a.wallet_reward.starts_with("449.99") || a.wallet_reward.starts_with("450"));
    }

    #[test]
    fn test_bundled_scenarios_pass() {
        for content in [
            include_str!("../../../scenarios/deploy.toml"),
            include_str!("../../../scenarios/top-up.toml"),
        ] {
            let scenario = Scenario::from_toml_str(content).unwrap();
            let report = simulate(&scenario, true).unwrap();
            assert_eq!(report.failures(), 0);
        }
    }

    #[test]
    fn test_failed_step_recorded() {
        let scenario = Scenario::from_toml_str(
            r#"
            start = 0

            [[steps]]
            action = "withdraw"
            account = "nobody"
            amount = "1"
            "#,
        )
        .unwrap();

        let report = simulate(&scenario, false).unwrap();
        assert_eq!(report.failures(), 1);
        assert!(report.steps[0].error.as_deref().unwrap().contains("Insufficient stake"));
        assert!(simulate(&scenario, true).is_err());
    }
}
