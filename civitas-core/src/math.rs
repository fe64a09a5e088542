//! 18-digit fixed-point helpers shared by staking and the tally.

use cosmwasm_std::{Decimal256, StdError, StdResult, Uint128, Uint256};

pub fn dec_from_uint(amount: Uint128) -> Decimal256 {
    Decimal256::from_ratio(Uint256::from(amount), Uint256::one())
}

/// Truncates toward zero.
pub fn dec_to_uint_floor(value: Decimal256) -> StdResult<Uint128> {
    Uint128::try_from(value.to_uint_floor())
        .map_err(|e| StdError::generic_err(format!("decimal out of range: {e}")))
}

/// `a * b / c`, with the product taken first so no precision is lost to an
/// intermediate truncation.
pub fn mul_div(a: Decimal256, b: Decimal256, c: Decimal256) -> StdResult<Decimal256> {
    a.checked_mul(b)
        .map_err(StdError::from)?
        .checked_div(c)
        .map_err(|e| StdError::generic_err(e.to_string()))
}

pub fn checked_div(a: Decimal256, b: Decimal256) -> StdResult<Decimal256> {
    a.checked_div(b)
        .map_err(|e| StdError::generic_err(e.to_string()))
}
