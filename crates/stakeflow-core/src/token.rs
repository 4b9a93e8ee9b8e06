//! # Token Collaborator
//!
//! The pool never stores token balances itself. It moves the principal and
//! reward assets through the [`Token`] trait and trusts the returned
//! success or failure. [`InMemoryToken`] is a complete fungible token with
//! balances and allowances, used by the scenario runner and tests.

use crate::config::TokenConfig;
use crate::types::AccountId;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Token transfer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("Insufficient allowance for {spender}: needed {needed}, approved {approved}")]
    InsufficientAllowance {
        spender: AccountId,
        needed: u128,
        approved: u128,
    },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Fungible token operations consumed by the pool
pub trait Token {
    /// Ticker, for logs and reports
    fn symbol(&self) -> &str;

    fn balance_of(&self, account: &AccountId) -> u128;

    /// Move `amount` out of `from`, which must be the caller's own account
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` against the allowance `from` granted `spender`
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError>;
}

/// In-memory fungible token
#[derive(Clone, Debug, Default)]
pub struct InMemoryToken {
    symbol: String,
    decimals: u8,
    total_supply: u128,
    balances: HashMap<AccountId, u128>,
    allowances: HashMap<(AccountId, AccountId), u128>,
    /// Accounts whose transfers are refused
    frozen: HashSet<AccountId>,
}

impl InMemoryToken {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            ..Self::default()
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.symbol.clone(), config.decimals)
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Create `amount` new tokens in `account`
    pub fn mint(&mut self, account: &AccountId, amount: u128) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| TokenError::Rejected("supply overflow".into()))?;
        let balance = self.balances.entry(*account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::Rejected("balance overflow".into()))?;
        self.total_supply = supply;
        Ok(())
    }

    /// Let `spender` move up to `amount` of `owner`'s tokens
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Refuse every transfer into or out of `account`
    pub fn freeze(&mut self, account: &AccountId) {
        self.frozen.insert(*account);
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    fn check_frozen(&self, from: &AccountId, to: &AccountId) -> Result<(), TokenError> {
        if let Some(account) = [from, to].into_iter().find(|a| self.frozen.contains(*a)) {
            return Err(TokenError::Rejected(format!("account {} is frozen", account)));
        }
        Ok(())
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        self.check_frozen(from, to)?;

        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                needed: amount,
                available,
            });
        }

        self.balances.insert(*from, available - amount);
        *self.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

impl Token for InMemoryToken {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                spender: *spender,
                needed: amount,
                approved,
            });
        }

        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), approved - amount);
        Ok(())
    }
}
