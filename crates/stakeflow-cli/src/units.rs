//! Decimal token amounts <-> base units

use anyhow::{bail, Context};

/// Parse a decimal string such as `"30000"` or `"12.5"` into base units
pub fn parse_units(value: &str, decimals: u8) -> anyhow::Result<u128> {
    let value = value.trim().replace('_', "");
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value.as_str(), ""),
    };

    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if frac.len() > decimals as usize {
        bail!("amount {} has more than {} decimals", value, decimals);
    }

    let scale = 10u128
        .checked_pow(u32::from(decimals))
        .context("decimals too large")?;
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().with_context(|| format!("invalid amount: {}", value))?
    };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().with_context(|| format!("invalid amount: {}", value))?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .with_context(|| format!("amount {} overflows", value))
}

/// Format base units as a decimal string, trimming trailing zeros
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals));
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
