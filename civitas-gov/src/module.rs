use civitas_core::keepers::{BankKeeper, StakingKeeper};
use civitas_core::{AnyMsg, CoreError, Module, Router};
use cosmwasm_std::{Addr, Api, DepsMut, Env, Event, Response};

use crate::contract;
use crate::msg::ExecuteMsg;

/// Construction-time settings of the governance module.
#[derive(Debug, Clone, PartialEq)]
pub struct GovConfig {
    /// The only signer proposal messages may carry, and the sender of
    /// `MsgUpdateParams`.
    pub authority: Addr,
    /// Escrow account holding deposits.
    pub module_account: Addr,
    pub max_metadata_len: usize,
    pub max_title_len: usize,
    pub max_summary_len: usize,
}

impl GovConfig {
    pub fn new(authority: Addr, module_account: Addr) -> Self {
        Self {
            authority,
            module_account,
            max_metadata_len: 255,
            max_title_len: 255,
            max_summary_len: 10_200,
        }
    }
}

pub struct GovModule {
    pub config: GovConfig,
    pub bank: Box<dyn BankKeeper>,
    pub staking: Box<dyn StakingKeeper>,
}

impl GovModule {
    pub fn new(
        config: GovConfig,
        bank: Box<dyn BankKeeper>,
        staking: Box<dyn StakingKeeper>,
    ) -> Self {
        Self {
            config,
            bank,
            staking,
        }
    }
}

impl Module for GovModule {
    fn name(&self) -> &'static str {
        "gov"
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
        router: &Router,
        msg: &AnyMsg,
    ) -> Result<Response, CoreError> {
        let msg = ExecuteMsg::from_any(msg)?;
        Ok(contract::execute(deps, env, self, router, msg)?)
    }

    fn end_block(&self, deps: DepsMut, env: &Env, router: &Router) -> Result<Vec<Event>, CoreError> {
        Ok(contract::end_block(deps, env, self, router)?)
    }
}
