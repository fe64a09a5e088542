use civitas_core::{AnyMsg, CoreError, Module, Router};
use cosmwasm_std::{Addr, Api, DepsMut, Env, Response};

use crate::contract;
use crate::keeper::BaseKeeper;
use crate::msg::ExecuteMsg;

/// Router entry for bank messages.
pub struct BankModule {
    pub keeper: BaseKeeper,
    /// Address allowed to change send-enabled flags.
    pub authority: Addr,
}

impl BankModule {
    pub fn new(authority: Addr) -> Self {
        Self {
            keeper: BaseKeeper,
            authority,
        }
    }
}

impl Module for BankModule {
    fn name(&self) -> &'static str {
        "bank"
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
