use civitas_core::coins::{coins_to_string, is_all_gte, normalize, validate_coins};
use civitas_core::keepers::BankKeeper;
use civitas_core::CoreError;
use cosmwasm_std::{Addr, Coin, Order, StdError, StdResult, Storage, Uint128};

use crate::state::{BALANCES, SEND_ENABLED, SUPPLY};

/// Store-backed bank keeper.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseKeeper;

impl BaseKeeper {
    pub fn balance(&self, store: &dyn Storage, addr: &Addr, denom: &str) -> StdResult<Uint128> {
        Ok(BALANCES
            .may_load(store, (addr, denom))?
            .unwrap_or_default())
    }

    pub fn all_balances(&self, store: &dyn Storage, addr: &Addr) -> StdResult<Vec<Coin>> {
        BALANCES
            .prefix(addr)
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(denom, amount)| Coin::new(amount, denom)))
            .collect()
    }

    pub fn supply_of(&self, store: &dyn Storage, denom: &str) -> StdResult<Uint128> {
        Ok(SUPPLY.may_load(store, denom)?.unwrap_or_default())
    }

    pub fn is_send_enabled(&self, store: &dyn Storage, denom: &str) -> StdResult<bool> {
        Ok(SEND_ENABLED.may_load(store, denom)?.unwrap_or(true))
    }

    pub fn set_send_enabled(
        &self,
        store: &mut dyn Storage,
        denom: &str,
        enabled: bool,
    ) -> StdResult<()> {
        SEND_ENABLED.save(store, denom, &enabled)
    }

    fn add_balance(&self, store: &mut dyn Storage, addr: &Addr, coin: &Coin) -> StdResult<()> {
        BALANCES.update(store, (addr, coin.denom.as_str()), |current| {
            current
                .unwrap_or_default()
                .checked_add(coin.amount)
                .map_err(StdError::from)
        })?;
        Ok(())
    }

    fn sub_balance(
        &self,
        store: &mut dyn Storage,
        addr: &Addr,
        coin: &Coin,
    ) -> Result<(), CoreError> {
        let current = self.balance(store, addr, &coin.denom)?;
        let remaining = current
            .checked_sub(coin.amount)
            .map_err(|_| CoreError::InsufficientFunds {
                required: coins_to_string(std::slice::from_ref(coin)),
                available: format!("{current}{}", coin.denom),
            })?;
        if remaining.is_zero() {
            BALANCES.remove(store, (addr, coin.denom.as_str()));
        } else {
            BALANCES.save(store, (addr, coin.denom.as_str()), &remaining)?;
        }
        Ok(())
    }

    fn checked_set(&self, amount: &[Coin]) -> Result<Vec<Coin>, CoreError> {
        let amount = normalize(amount)?;
        validate_coins(&amount)?;
        Ok(amount)
    }

    /// Fails before any write when `addr` cannot cover all of `amount`.
    fn ensure_covers(
        &self,
        store: &dyn Storage,
        addr: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError> {
        let held = self.all_balances(store, addr)?;
        if !is_all_gte(&held, amount) {
            return Err(CoreError::InsufficientFunds {
                required: coins_to_string(amount),
                available: coins_to_string(&held),
            });
        }
        Ok(())
    }
}

impl BankKeeper for BaseKeeper {
    fn send_coins(
        &self,
        store: &mut dyn Storage,
        from: &Addr,
        to: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError> {
        let amount = self.checked_set(amount)?;
        self.ensure_covers(store, from, &amount)?;
        for coin in &amount {
            self.sub_balance(store, from, coin)?;
            self.add_balance(store, to, coin)?;
        }
        Ok(())
    }

    fn burn_coins(
        &self,
        store: &mut dyn Storage,
        module: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError> {
        let amount = self.checked_set(amount)?;
        self.ensure_covers(store, module, &amount)?;
        for coin in &amount {
            self.sub_balance(store, module, coin)?;
            let supply = self.supply_of(store, &coin.denom)?;
            let supply = supply.checked_sub(coin.amount).map_err(StdError::from)?;
            SUPPLY.save(store, &coin.denom, &supply)?;
        }
        Ok(())
    }

    fn mint_coins(
        &self,
        store: &mut dyn Storage,
        module: &Addr,
        amount: &[Coin],
    ) -> Result<(), CoreError> {
        let amount = self.checked_set(amount)?;
        for coin in &amount {
            self.add_balance(store, module, coin)?;
            let supply = self.supply_of(store, &coin.denom)?;
            let supply = supply.checked_add(coin.amount).map_err(StdError::from)?;
            SUPPLY.save(store, &coin.denom, &supply)?;
        }
        Ok(())
    }

    fn spendable_coins(&self, store: &dyn Storage, addr: &Addr) -> StdResult<Vec<Coin>> {
        self.all_balances(store, addr)
    }

    fn is_send_enabled_coins(&self, store: &dyn Storage, coins: &[Coin]) -> Result<(), CoreError> {
        for coin in coins {
            if !self.is_send_enabled(store, &coin.denom)? {
                return Err(CoreError::SendDisabled {
                    denom: coin.denom.clone(),
                });
            }
        }
        Ok(())
    }
}
