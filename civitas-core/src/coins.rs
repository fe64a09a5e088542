//! Coin-set arithmetic over sorted, zero-free `Vec<Coin>` values.

use cosmwasm_std::{Coin, Coins, Decimal, StdError, Uint128};

use crate::error::CoreError;

/// Merges duplicate denoms, drops zero amounts and sorts by denom.
pub fn normalize(coins: &[Coin]) -> Result<Vec<Coin>, CoreError> {
    let mut set = Coins::default();
    for coin in coins {
        set.add(coin.clone())?;
    }
    Ok(set.into_vec())
}

fn validate_denom(denom: &str) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidCoins {
        reason: format!("invalid denom {denom:?}: {reason}"),
    };
    if denom.len() < 3 || denom.len() > 128 {
        return Err(invalid("length must be between 3 and 128"));
    }
    if !denom.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a letter"));
    }
    if !denom
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
    {
        return Err(invalid("contains an illegal character"));
    }
    Ok(())
}

/// A valid coin set has well-formed denoms, positive amounts and strictly
/// ascending denoms (so no duplicates). The empty set is valid.
pub fn validate_coins(coins: &[Coin]) -> Result<(), CoreError> {
    for (i, coin) in coins.iter().enumerate() {
        validate_denom(&coin.denom)?;
        if coin.amount.is_zero() {
            return Err(CoreError::InvalidCoins {
                reason: format!("zero amount for {}", coin.denom),
            });
        }
        if i > 0 && coins[i - 1].denom >= coin.denom {
            return Err(CoreError::InvalidCoins {
                reason: format!("denoms not sorted or duplicated at {}", coin.denom),
            });
        }
    }
    Ok(())
}

pub fn amount_of(coins: &[Coin], denom: &str) -> Uint128 {
    coins
        .iter()
        .filter(|c| c.denom == denom)
        .map(|c| c.amount)
        .fold(Uint128::zero(), |acc, a| acc.saturating_add(a))
}

pub fn add_coins(a: &[Coin], b: &[Coin]) -> Result<Vec<Coin>, CoreError> {
    let mut set = Coins::default();
    for coin in a.iter().chain(b) {
        set.add(coin.clone())?;
    }
    Ok(set.into_vec())
}

/// `a - b`, failing with [`CoreError::InsufficientFunds`] when any denom of
/// `b` exceeds what `a` holds.
pub fn sub_coins(a: &[Coin], b: &[Coin]) -> Result<Vec<Coin>, CoreError> {
    if !is_all_gte(a, b) {
        return Err(CoreError::InsufficientFunds {
            required: coins_to_string(b),
            available: coins_to_string(a),
        });
    }
    let mut set = Coins::default();
    for coin in a {
        set.add(coin.clone())?;
    }
    for coin in b {
        set.sub(coin.clone())?;
    }
    Ok(set.into_vec())
}

/// True when `a` holds at least every amount in `b`. Denoms absent from `b`
/// are unconstrained.
pub fn is_all_gte(a: &[Coin], b: &[Coin]) -> bool {
    let mut required = Coins::default();
    for coin in b {
        if required.add(coin.clone()).is_err() {
            return false;
        }
    }
    required
        .iter()
        .all(|coin| amount_of(a, &coin.denom) >= coin.amount)
}

/// Scales every amount by `ratio`, truncating, and drops denoms that round
/// to zero.
pub fn mul_dec_truncate(coins: &[Coin], ratio: Decimal) -> Result<Vec<Coin>, CoreError> {
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        let amount = coin
            .amount
            .checked_mul_floor(ratio)
            .map_err(|e| StdError::generic_err(e.to_string()))?;
        if !amount.is_zero() {
            out.push(Coin::new(amount, coin.denom.clone()));
        }
    }
    normalize(&out)
}

/// True when every denom of `coins` appears in `allowed`.
pub fn denoms_subset_of(coins: &[Coin], allowed: &[Coin]) -> bool {
    coins
        .iter()
        .all(|c| allowed.iter().any(|a| a.denom == c.denom))
}

/// `"100stake,5uatom"`; the empty set renders as an empty string.
pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| format!("{}{}", c.amount, c.denom))
        .collect::<Vec<_>>()
        .join(",")
}
