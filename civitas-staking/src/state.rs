use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal256, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub enum BondStatus {
    Bonded,
    Unbonded,
}

#[cw_serde]
pub struct Validator {
    pub operator: Addr,
    pub tokens: Uint128,
    /// Total shares issued to delegators; `tokens / delegator_shares` is the
    /// exchange rate.
    pub delegator_shares: Decimal256,
    pub status: BondStatus,
}

impl Validator {
    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }
}

#[cw_serde]
pub struct Delegation {
    pub delegator: Addr,
    pub validator: Addr,
    pub shares: Decimal256,
}

pub const BOND_DENOM: Item<String> = Item::new("\u{40}");
pub const VALIDATORS: Map<&Addr, Validator> = Map::new("\u{41}");
/// Keyed `(delegator, validator)`.
pub const DELEGATIONS: Map<(&Addr, &Addr), Delegation> = Map::new("\u{42}");
