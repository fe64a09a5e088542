use civitas_core::authz::AuthorizationRegistry;
use civitas_core::keepers::AccountKeeper;
use civitas_core::{AnyMsg, CoreError, Module, Router};
use cosmwasm_std::{Api, DepsMut, Env, Event, Response};

use crate::authorization::{CountAuthorization, GenericAuthorization};
use crate::contract;
use crate::msg::ExecuteMsg;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthzConfig {
    /// Upper bound on the messages a single `MsgExec` may carry.
    pub max_msgs_per_exec: usize,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            max_msgs_per_exec: 32,
        }
    }
}

pub struct AuthzModule {
    pub config: AuthzConfig,
    pub registry: AuthorizationRegistry,
    pub accounts: Box<dyn AccountKeeper>,
}

impl AuthzModule {
    /// Registers the authz-owned variants on top of `registry`, which should
    /// already hold the variants owned by other modules.
    pub fn new(
        config: AuthzConfig,
        mut registry: AuthorizationRegistry,
        accounts: Box<dyn AccountKeeper>,
    ) -> Result<Self, CoreError> {
        registry.register::<GenericAuthorization>()?;
        registry.register::<CountAuthorization>()?;
        Ok(Self {
            config,
            registry,
            accounts,
        })
    }
}

impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
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

    fn end_block(&self, deps: DepsMut, env: &Env, _router: &Router) -> Result<Vec<Event>, CoreError> {
        Ok(contract::end_block(deps, env)?)
    }
}
