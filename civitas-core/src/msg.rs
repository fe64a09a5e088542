use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Addr, Api, Binary, StdResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Polymorphic payload: a fully-qualified type URL plus an encoded body.
///
/// Used for proposal messages, messages executed through a grant, and
/// authorization variants stored inside grants.
#[cw_serde]
pub struct AnyMsg {
    pub type_url: String,
    pub value: Binary,
}

impl AnyMsg {
    pub fn new(type_url: impl Into<String>, value: Binary) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// A concrete type that can be packed into an [`AnyMsg`].
pub trait TypeUrl: Serialize + DeserializeOwned {
    const TYPE_URL: &'static str;

    fn to_any(&self) -> StdResult<AnyMsg> {
        Ok(AnyMsg {
            type_url: Self::TYPE_URL.to_string(),
            value: to_json_binary(self)?,
        })
    }

    fn from_any(msg: &AnyMsg) -> Result<Self, CoreError> {
        if msg.type_url != Self::TYPE_URL {
            return Err(CoreError::UnexpectedMsgType {
                expected: Self::TYPE_URL.to_string(),
                got: msg.type_url.clone(),
            });
        }
        Ok(from_json(&msg.value)?)
    }
}

/// A routable state-mutation message.
pub trait TypedMsg: TypeUrl {
    /// Addresses that must have authorized this message, as written in it.
    fn signers(&self) -> Vec<String>;

    /// Stateless checks run before the message reaches its handler.
    fn validate_basic(&self, _api: &dyn Api) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Validates a bech32 address through the chain's address codec.
pub fn validate_addr(api: &dyn Api, address: &str) -> Result<Addr, CoreError> {
    api.addr_validate(address)
        .map_err(|_| CoreError::InvalidAddress {
            address: address.to_string(),
        })
}
