//! Narrow interfaces to the collaborators governance and authz consume.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal256, StdResult, Storage, Uint128};

use crate::error::CoreError;

pub trait BankKeeper {
    /// Moves `amount` from `from` to `to`, failing on insufficient funds.
    fn send_coins(
        &self,
        store: &mut dyn Storage,
        from: &Addr,
        to: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError>;

    /// Destroys `amount` held by the module account `module`.
    fn burn_coins(
        &self,
        store: &mut dyn Storage,
        module: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError>;

    fn mint_coins(
        &self,
        store: &mut dyn Storage,
        module: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError>;

    fn spendable_coins(&self, store: &dyn Storage, addr: &Addr) -> StdResult<Vec<Coin>>;

    fn is_send_enabled_coins(&self, store: &dyn Storage, coins: &[Coin]) -> Result<(), CoreError>;
}

/// Bonded validator as seen by the tally.
#[cw_serde]
pub struct ValidatorPower {
    pub operator: Addr,
    pub tokens: Uint128,
    pub delegator_shares: Decimal256,
}

#[cw_serde]
pub struct DelegationShares {
    pub delegator: Addr,
    pub validator: Addr,
    pub shares: Decimal256,
}

pub trait StakingKeeper {
    fn total_bonded_tokens(&self, store: &dyn Storage) -> StdResult<Uint128>;

    /// Visits bonded validators in operator order until `f` returns `true`.
    fn iterate_bonded_validators(
        &self,
        store: &dyn Storage,
        f: &mut dyn FnMut(ValidatorPower) -> StdResult<bool>,
    ) -> StdResult<()>;

    /// Visits the delegations of `delegator` in validator order until `f`
    /// returns `true`.
    fn iterate_delegations(
        &self,
        store: &dyn Storage,
        delegator: &Addr,
        f: &mut dyn FnMut(DelegationShares) -> StdResult<bool>,
    ) -> StdResult<()>;

    fn validator(&self, store: &dyn Storage, operator: &Addr) -> StdResult<Option<ValidatorPower>>;
}

#[cw_serde]
pub struct BaseAccount {
    pub address: Addr,
    pub account_number: u64,
}

pub trait AccountKeeper {
    fn get_account(&self, store: &dyn Storage, addr: &Addr) -> StdResult<Option<BaseAccount>>;

    fn has_account(&self, store: &dyn Storage, addr: &Addr) -> StdResult<bool> {
        Ok(self.get_account(store, addr)?.is_some())
    }

    /// Builds an account with the next account number. Not persisted until
    /// passed to [`AccountKeeper::set_account`].
    fn new_account_with_address(
        &self,
        store: &mut dyn Storage,
        addr: &Addr,
    ) -> StdResult<BaseAccount>;

    fn set_account(&self, store: &mut dyn Storage, account: &BaseAccount) -> StdResult<()>;
}
