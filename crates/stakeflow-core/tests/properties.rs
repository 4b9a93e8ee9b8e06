//! Property tests for reward accounting invariants

use proptest::prelude::*;
use stakeflow_core::{AccountId, Fixed, InMemoryToken, PoolConfig, StakingPool};

const DURATION: u64 = 10_000;
const PARTICIPANTS: usize = 3;

type Pool = StakingPool<InMemoryToken, InMemoryToken>;

#[derive(Debug, Clone)]
enum Op {
    Stake(usize, u128),
    Withdraw(usize, u128),
    Claim(usize),
    Exit(usize),
    Advance(u64),
    Notify(u128),
    /// Notify stamped `secs` before the current time
    StaleNotify(u128, u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..PARTICIPANTS, 1..1_000_000u128).prop_map(|(i, a)| Op::Stake(i, a)),
        2 => (0..PARTICIPANTS, 1..1_000_000u128).prop_map(|(i, a)| Op::Withdraw(i, a)),
        2 => (0..PARTICIPANTS).prop_map(Op::Claim),
        1 => (0..PARTICIPANTS).prop_map(Op::Exit),
        3 => (0..5_000u64).prop_map(Op::Advance),
        1 => (1..10_000_000_000u128).prop_map(Op::Notify),
        1 => (1..10_000_000_000u128, 1..5_000u64).prop_map(|(a, s)| Op::StaleNotify(a, s)),
    ]
}

fn participants() -> Vec<AccountId> {
    (0..PARTICIPANTS)
        .map(|i| AccountId::from_label(&format!("participant-{}", i)))
        .collect()
}

fn new_pool(accounts: &[AccountId]) -> Pool {
    let mut pool = StakingPool::from_config(
        &PoolConfig {
            rewards_duration: DURATION,
            ..PoolConfig::default()
        },
        InMemoryToken::new("USDT", 18),
        InMemoryToken::new("TTT", 18),
    )
    .unwrap();

    let custody = pool.custody();
    for who in accounts {
        pool.staking_token_mut().mint(who, u128::from(u64::MAX)).unwrap();
        pool.staking_token_mut().approve(who, &custody, u128::from(u64::MAX));
    }
    pool
}

fn notify(pool: &mut Pool, amount: u128, at: u64) -> stakeflow_core::Result<u128> {
    let custody = pool.custody();
    let owner = pool.owner();
    pool.rewards_token_mut().mint(&custody, amount).unwrap();
    pool.notify_reward_amount(&owner, amount, at).map(|_| 0)
}

fn apply(pool: &mut Pool, accounts: &[AccountId], op: &Op, now: &mut u64) {
    // rejected operations are expected; the invariants must hold either way
    let _ = match op {
        Op::Stake(i, amount) => pool.stake(&accounts[*i], *amount, *now).map(|_| 0),
        Op::Withdraw(i, amount) => pool.withdraw(&accounts[*i], *amount, *now).map(|_| 0),
        Op::Claim(i) => pool.get_reward(&accounts[*i], *now),
        Op::Exit(i) => pool.exit(&accounts[*i], *now),
        Op::Advance(secs) => {
            *now += secs;
            Ok(0)
        }
        Op::Notify(amount) => notify(pool, *amount, *now),
        Op::StaleNotify(amount, secs) => notify(pool, *amount, now.saturating_sub(*secs)),
    };
}

proptest! {
    #[test]
    fn prop_conservation(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let accounts = participants();
        let mut pool = new_pool(&accounts);
        let mut now = 1_000u64;
        let mut last_rpt = Fixed::zero();

        for op in &ops {
            apply(&mut pool, &accounts, op, &mut now);

            let outstanding: u128 = accounts
                .iter()
                .map(|a| pool.earned(a, now).unwrap())
                .sum();
            prop_assert!(
                pool.total_reward_paid() + outstanding <= pool.total_reward_notified(),
                "paid {} + owed {} exceeds notified {}",
                pool.total_reward_paid(),
                outstanding,
                pool.total_reward_notified()
            );

            prop_assert_eq!(pool.total_staked(), pool.ledger().total_balance());

            let rpt = pool.accumulator().reward_per_token_stored();
            prop_assert!(rpt >= last_rpt, "accumulator decreased");
            last_rpt = rpt;
        }
    }

    #[test]
    fn prop_proportional_shares(
        a in 1..1_000_000_000u128,
        b in 1..1_000_000_000u128,
        reward in 1_000..1_000_000_000_000u128,
        elapsed in 1..DURATION,
    ) {
        let accounts = participants();
        let mut pool = new_pool(&accounts);
        let custody = pool.custody();
        let owner = pool.owner();
        pool.rewards_token_mut().mint(&custody, reward).unwrap();
        pool.notify_reward_amount(&owner, reward, 0).unwrap();

        pool.stake(&accounts[0], a, 0).unwrap();
        pool.stake(&accounts[1], b, 0).unwrap();

        let earned_a = pool.earned(&accounts[0], elapsed).unwrap();
        let earned_b = pool.earned(&accounts[1], elapsed).unwrap();

        // each share is truncated by less than one unit
        let skew = (earned_a * b).abs_diff(earned_b * a);
        prop_assert!(skew <= a.max(b), "skew {} for {}:{}", skew, a, b);
    }

    #[test]
    fn prop_settle_idempotent(stake in 1..1_000_000u128, at in 0..2 * DURATION) {
        let accounts = participants();
        let mut pool = new_pool(&accounts);
        let custody = pool.custody();
        let owner = pool.owner();
        pool.rewards_token_mut().mint(&custody, 1_000_000).unwrap();
        pool.notify_reward_amount(&owner, 1_000_000, 0).unwrap();
        pool.stake(&accounts[0], stake, 0).unwrap();

        pool.settle(&accounts[0], at).unwrap();
        prop_assert_eq!(pool.settle(&accounts[0], at).unwrap(), 0);
    }

    #[test]
    fn prop_no_accrual_without_stake(idle in 1..DURATION, stake in 1..1_000_000u128) {
        let accounts = participants();
        let mut pool = new_pool(&accounts);
        let custody = pool.custody();
        let owner = pool.owner();
        let reward = 1_000_000u128;
        pool.rewards_token_mut().mint(&custody, reward).unwrap();
        pool.notify_reward_amount(&owner, reward, 0).unwrap();

        pool.stake(&accounts[0], stake, idle).unwrap();
        prop_assert_eq!(pool.earned(&accounts[0], idle).unwrap(), 0);

        // only the staked part of the period can ever be earned
        let earned = pool.earned(&accounts[0], DURATION).unwrap();
        let ceiling = reward * u128::from(DURATION - idle) / u128::from(DURATION);
        prop_assert!(earned <= ceiling, "earned {} above {}", earned, ceiling);
    }

    #[test]
    fn prop_flat_after_expiry(stake in 1..1_000_000u128, past in 0..1_000_000u64) {
        let accounts = participants();
        let mut pool = new_pool(&accounts);
        let custody = pool.custody();
        let owner = pool.owner();
        pool.rewards_token_mut().mint(&custody, 5_000_000).unwrap();
        pool.notify_reward_amount(&owner, 5_000_000, 0).unwrap();
        pool.stake(&accounts[0], stake, 0).unwrap();

        let at_finish = pool.earned(&accounts[0], DURATION).unwrap();
        prop_assert_eq!(pool.earned(&accounts[0], DURATION + past).unwrap(), at_finish);
    }

    #[test]
    fn prop_fixed_point_rounds_down(n in 0..u64::MAX as u128, d in 1..u64::MAX as u128, q in 0..u64::MAX as u128) {
        let ratio = Fixed::from_ratio(n, d).unwrap();
        // q × n / d, exactly, is never exceeded
        let paid = ratio.mul_floor(q).unwrap();
        let exact = primitive_types::U256::from(q) * primitive_types::U256::from(n)
            / primitive_types::U256::from(d);
        prop_assert!(primitive_types::U256::from(paid) <= exact);
    }
}
