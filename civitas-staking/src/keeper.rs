use civitas_core::keepers::{DelegationShares, StakingKeeper, ValidatorPower};
use civitas_core::math::{dec_from_uint, mul_div};
use cosmwasm_std::{Addr, Decimal256, Order, StdError, StdResult, Storage, Uint128};

use crate::error::ContractError;
use crate::state::{Delegation, Validator, DELEGATIONS, VALIDATORS};

/// Share accounting for validators and delegations. Token custody lives in
/// the bank; callers move coins alongside these updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keeper;

impl Keeper {
    pub fn load_validator(
        &self,
        store: &dyn Storage,
        operator: &Addr,
    ) -> Result<Validator, ContractError> {
        VALIDATORS
            .may_load(store, operator)?
            .ok_or_else(|| ContractError::ValidatorNotFound {
                address: operator.to_string(),
            })
    }

    /// Adds `amount` tokens to `validator`, issuing shares to `delegator` at
    /// the current exchange rate. Returns the shares issued.
    pub fn delegate(
        &self,
        store: &mut dyn Storage,
        delegator: &Addr,
        validator: &Addr,
        amount: Uint128,
    ) -> Result<Decimal256, ContractError> {
        if amount.is_zero() {
            return Err(ContractError::ZeroAmount);
        }
        let mut val = self.load_validator(store, validator)?;
        let issued = if val.tokens.is_zero() || val.delegator_shares.is_zero() {
            dec_from_uint(amount)
        } else {
            mul_div(
                dec_from_uint(amount),
                val.delegator_shares,
                dec_from_uint(val.tokens),
            )?
        };
        val.tokens = val.tokens.checked_add(amount).map_err(StdError::from)?;
        val.delegator_shares = val
            .delegator_shares
            .checked_add(issued)
            .map_err(StdError::from)?;
        VALIDATORS.save(store, validator, &val)?;

        let mut delegation = DELEGATIONS
            .may_load(store, (delegator, validator))?
            .unwrap_or_else(|| Delegation {
                delegator: delegator.clone(),
                validator: validator.clone(),
                shares: Decimal256::zero(),
            });
        delegation.shares = delegation.shares.checked_add(issued).map_err(StdError::from)?;
        DELEGATIONS.save(store, (delegator, validator), &delegation)?;
        Ok(issued)
    }

    /// Removes `amount` tokens worth of shares from the delegation.
    pub fn undelegate(
        &self,
        store: &mut dyn Storage,
        delegator: &Addr,
        validator: &Addr,
        amount: Uint128,
    ) -> Result<Decimal256, ContractError> {
        if amount.is_zero() {
            return Err(ContractError::ZeroAmount);
        }
        let mut val = self.load_validator(store, validator)?;
        let mut delegation = DELEGATIONS
            .may_load(store, (delegator, validator))?
            .ok_or_else(|| ContractError::DelegationNotFound {
                delegator: delegator.to_string(),
                validator: validator.to_string(),
            })?;
        if amount > val.tokens {
            return Err(ContractError::InsufficientShares);
        }
        let shares = mul_div(
            dec_from_uint(amount),
            val.delegator_shares,
            dec_from_uint(val.tokens),
        )?;
        if shares > delegation.shares {
            return Err(ContractError::InsufficientShares);
        }

        val.tokens = val.tokens.checked_sub(amount).map_err(StdError::from)?;
        val.delegator_shares = val
            .delegator_shares
            .checked_sub(shares)
            .map_err(StdError::from)?;
        VALIDATORS.save(store, validator, &val)?;

        delegation.shares = delegation.shares.checked_sub(shares).map_err(StdError::from)?;
        if delegation.shares.is_zero() {
            DELEGATIONS.remove(store, (delegator, validator));
        } else {
            DELEGATIONS.save(store, (delegator, validator), &delegation)?;
        }
        Ok(shares)
    }
}

fn power_of(val: &Validator) -> ValidatorPower {
    ValidatorPower {
        operator: val.operator.clone(),
        tokens: val.tokens,
        delegator_shares: val.delegator_shares,
    }
}

impl StakingKeeper for Keeper {
    fn total_bonded_tokens(&self, store: &dyn Storage) -> StdResult<Uint128> {
        let mut total = Uint128::zero();
        for item in VALIDATORS.range(store, None, None, Order::Ascending) {
            let (_, val) = item?;
            if val.is_bonded() {
                total = total.checked_add(val.tokens)?;
            }
        }
        Ok(total)
    }

    fn iterate_bonded_validators(
        &self,
        store: &dyn Storage,
        f: &mut dyn FnMut(ValidatorPower) -> StdResult<bool>,
    ) -> StdResult<()> {
        for item in VALIDATORS.range(store, None, None, Order::Ascending) {
            let (_, val) = item?;
            if val.is_bonded() && f(power_of(&val))? {
                break;
            }
        }
        Ok(())
    }

    fn iterate_delegations(
        &self,
        store: &dyn Storage,
        delegator: &Addr,
        f: &mut dyn FnMut(DelegationShares) -> StdResult<bool>,
    ) -> StdResult<()> {
        for item in DELEGATIONS
            .prefix(delegator)
            .range(store, None, None, Order::Ascending)
        {
            let (_, delegation) = item?;
            let stop = f(DelegationShares {
                delegator: delegation.delegator,
                validator: delegation.validator,
                shares: delegation.shares,
            })?;
            if stop {
                break;
            }
        }
        Ok(())
    }

    fn validator(&self, store: &dyn Storage, operator: &Addr) -> StdResult<Option<ValidatorPower>> {
        Ok(VALIDATORS.may_load(store, operator)?.map(|val| power_of(&val)))
    }
}
