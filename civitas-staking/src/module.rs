use civitas_core::keepers::BankKeeper;
use civitas_core::{AnyMsg, CoreError, Module, Router};
use cosmwasm_std::{Addr, Api, DepsMut, Env, Response};

use crate::contract;
use crate::keeper::Keeper;
use crate::msg::ExecuteMsg;

/// Router entry for staking messages.
pub struct StakingModule {
    pub keeper: Keeper,
    pub bank: Box<dyn BankKeeper>,
    /// Module account holding every bonded token.
    pub bonded_pool: Addr,
}

impl StakingModule {
    pub fn new(bank: Box<dyn BankKeeper>, bonded_pool: Addr) -> Self {
        Self {
            keeper: Keeper,
            bank,
            bonded_pool,
        }
    }
}

impl Module for StakingModule {
    fn name(&self) -> &'static str {
        "staking"
    }

    fn msg_type_urls(&self) -> Vec<&'static str> {
        ExecuteMsg::TYPE_URLS.to_vec()
    }

    fn signers(&self, msg: &AnyMsg) -> Result<Vec<String>, CoreError> {
        Ok(ExecuteMsg::from_any(msg)?.signers())
    }

    fn validate_basic(&self, api: &dyn Api, msg: &AnyMsg) -> Result<(), CoreError> {
        ExecuteMsg::from_any(msg)?.validate_basic(api)
    }

    fn execute(
        &self,
        deps: DepsMut,
        env: &Env,
        _router: &Router,
        msg: &AnyMsg,
    ) -> Result<Response, CoreError> {
        let msg = ExecuteMsg::from_any(msg)?;
        Ok(contract::execute(deps, env, self, msg)?)
    }
}
