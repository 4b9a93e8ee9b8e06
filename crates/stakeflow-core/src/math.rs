//! # Fixed-Point Arithmetic
//!
//! Every reward-per-unit value in the pool is a [`Fixed`]: an unsigned
//! integer scaled by [`PRECISION`] (10^18), held in 256 bits so that the
//! intermediate products of `rate × elapsed` and `balance × Δrpt` never
//! overflow for realistic token supplies.
//!
//! ```text
//! from_ratio(n, d)       = n × PRECISION / d
//! accrue(rate, t, total) = rate × t / total
//! mul_floor(x, q)        = x × q / PRECISION
//! ```
//!
//! All operations multiply before dividing and truncate toward zero, so a
//! rounding error always stays in the pool and is never paid out.

use crate::constants::PRECISION;
use crate::error::{Result, StakeError};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

fn scale() -> U256 {
    U256::from(PRECISION)
}

/// `a × b / denominator`, truncated toward zero
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(StakeError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(StakeError::Overflow)?;
    Ok(product / denominator)
}

/// Narrow a 256-bit value back to a token amount
pub fn to_u128(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(StakeError::Overflow);
    }
    Ok(value.low_u128())
}

/// Unsigned fixed-point number scaled by [`PRECISION`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(U256);

impl Fixed {
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Scaled representation
    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole number as fixed-point
    pub fn from_int(value: u128) -> Self {
        // u128::MAX × 10^18 < 2^256
        Self(U256::from(value) * scale())
    }

    /// `numerator / denominator` as fixed-point
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self> {
        mul_div(U256::from(numerator), scale(), U256::from(denominator)).map(Self)
    }

    /// Per-unit accrual of this rate over `elapsed` seconds, shared across `total` units
    pub fn accrue(self, elapsed: u64, total: u128) -> Result<Self> {
        mul_div(self.0, U256::from(elapsed), U256::from(total)).map(Self)
    }

    /// `self × quantity`, truncated to a whole amount
    pub fn mul_floor(self, quantity: u128) -> Result<u128> {
        to_u128(mul_div(self.0, U256::from(quantity), scale())?)
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0.checked_add(other.0).map(Self).ok_or(StakeError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or(StakeError::Overflow)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / scale();
        let frac = (self.0 % scale()).low_u128();
        write!(f, "{}.{:018}", whole, frac)
    }
}
