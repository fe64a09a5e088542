use cosmwasm_std::{Addr, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use crate::keepers::{AccountKeeper, BaseAccount};

pub const ACCOUNTS: Map<&Addr, BaseAccount> = Map::new("\u{20}");
pub const NEXT_ACCOUNT_NUMBER: Item<u64> = Item::new("\u{21}");

/// Store-backed [`AccountKeeper`] numbering accounts from zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseAccountKeeper;

impl AccountKeeper for BaseAccountKeeper {
    fn get_account(&self, store: &dyn Storage, addr: &Addr) -> StdResult<Option<BaseAccount>> {
        ACCOUNTS.may_load(store, addr)
    }

    fn has_account(&self, store: &dyn Storage, addr: &Addr) -> StdResult<bool> {
        Ok(ACCOUNTS.has(store, addr))
    }

    fn new_account_with_address(
        &self,
        store: &mut dyn Storage,
        addr: &Addr,
    ) -> StdResult<BaseAccount> {
        let account_number = NEXT_ACCOUNT_NUMBER.may_load(store)?.unwrap_or_default();
        NEXT_ACCOUNT_NUMBER.save(store, &(account_number + 1))?;
        Ok(BaseAccount {
            address: addr.clone(),
            account_number,
        })
    }

    fn set_account(&self, store: &mut dyn Storage, account: &BaseAccount) -> StdResult<()> {
        ACCOUNTS.save(store, &account.address, account)
    }
}
