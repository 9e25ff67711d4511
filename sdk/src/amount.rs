//! Decimal amount → integer base units.
//!
//! Conversion is exact and always floors: excess fractional digits are dropped,
//! never rounded up, so a transfer never promises more than the caller asked for.

use crate::constants::{ETH_DECIMALS, LAMPORTS_PER_SOL, SOL_DECIMALS};
use crate::error::{BridgeError, Result};

/// Parse a non-negative decimal string (`"12"`, `"0.0036"`, `".5"`) into base
/// units with `decimals` fractional digits.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128> {
    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(BridgeError::AmountConversion(format!("'{}' is not a number", amount)));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(BridgeError::AmountConversion(format!(
            "'{}' is not a non-negative decimal",
            amount
        )));
    }

    let overflow = || BridgeError::AmountConversion(format!("'{}' is too large", amount));
    let scale = 10u128.checked_pow(decimals).ok_or_else(overflow)?;

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| overflow())?
            .checked_mul(scale)
            .ok_or_else(overflow)?
    };

    // Keep at most `decimals` fractional digits (floor), right-pad the rest.
    let kept: String = frac.chars().take(decimals as usize).collect();
    let frac_units = if kept.is_empty() {
        0
    } else {
        let padding = decimals - kept.len() as u32;
        kept.parse::<u128>()
            .map_err(|_| overflow())?
            .checked_mul(10u128.pow(padding))
            .ok_or_else(overflow)?
    };

    whole_units.checked_add(frac_units).ok_or_else(overflow)
}

/// SOL → lamports. Rejects NaN, infinities and negative values.
///
/// The float goes through its shortest round-trip decimal form, so `0.0036`
/// becomes exactly 3_600_000 lamports rather than whatever `0.0036 * 1e9` rounds to.
pub fn sol_to_lamports(amount_sol: f64) -> Result<u64> {
    if !amount_sol.is_finite() {
        return Err(BridgeError::AmountConversion(format!("{} is not finite", amount_sol)));
    }
    if amount_sol.is_sign_negative() && amount_sol != 0.0 {
        return Err(BridgeError::AmountConversion(format!("{} is negative", amount_sol)));
    }
    let lamports = parse_units(&amount_sol.abs().to_string(), SOL_DECIMALS)?;
    u64::try_from(lamports).map_err(|_| {
        BridgeError::AmountConversion(format!("{} SOL does not fit in u64 lamports", amount_sol))
    })
}

/// SOL decimal string → lamports.
pub fn parse_sol(amount_sol: &str) -> Result<u64> {
    let lamports = parse_units(amount_sol, SOL_DECIMALS)?;
    u64::try_from(lamports).map_err(|_| {
        BridgeError::AmountConversion(format!("{} SOL does not fit in u64 lamports", amount_sol))
    })
}

/// ETH decimal string → wei.
pub fn ether_to_wei(amount_ether: &str) -> Result<u128> {
    parse_units(amount_ether, ETH_DECIMALS)
}

/// Lamports → SOL decimal string, trailing zeros trimmed (`1_500_000_000` → `"1.5"`).
pub fn lamports_to_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = SOL_DECIMALS as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
