use civitas_core::authz::{AcceptResponse, Authorization};
use civitas_core::{AnyMsg, CoreError, TypeUrl};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Deps, Env};

use crate::error::ContractError;

/// Unrestricted permission to execute one message type on the granter's behalf.
#[cw_serde]
pub struct GenericAuthorization {
    pub msg: String,
}

impl GenericAuthorization {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl TypeUrl for GenericAuthorization {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.GenericAuthorization";
}

impl Authorization for GenericAuthorization {
    fn msg_type_url(&self) -> String {
        self.msg.clone()
    }

    fn validate_basic(&self, _api: &dyn Api) -> Result<(), CoreError> {
        if self.msg.is_empty() {
            return Err(ContractError::InvalidAuthorization {
                reason: "message type url must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn accept(&self, _deps: Deps, _env: &Env, _msg: &AnyMsg) -> Result<AcceptResponse, CoreError> {
        Ok(AcceptResponse::accepted())
    }
}

/// Like [`GenericAuthorization`], but good for `count` executions only.
#[cw_serde]
pub struct CountAuthorization {
    pub msg: String,
    pub count: u64,
}

impl TypeUrl for CountAuthorization {
    const TYPE_URL: &'static str = "/civitas.authz.v1.CountAuthorization";
}

impl Authorization for CountAuthorization {
    fn msg_type_url(&self) -> String {
        self.msg.clone()
    }

    fn validate_basic(&self, _api: &dyn Api) -> Result<(), CoreError> {
        if self.msg.is_empty() {
            return Err(ContractError::InvalidAuthorization {
                reason: "message type url must not be empty".to_string(),
            }
            .into());
        }
        if self.count == 0 {
            return Err(ContractError::InvalidAuthorization {
                reason: "count must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn accept(&self, _deps: Deps, _env: &Env, _msg: &AnyMsg) -> Result<AcceptResponse, CoreError> {
        match self.count {
            0 => Ok(AcceptResponse::rejected()),
            1 => Ok(AcceptResponse::consumed()),
            n => {
                let updated = CountAuthorization {
                    msg: self.msg.clone(),
                    count: n - 1,
                };
                Ok(AcceptResponse::updated(updated.to_any()?))
            }
        }
    }
}
