use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl, TypedMsg};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Api, Binary, Timestamp};

use crate::error::ContractError;
use crate::state::Grant;

#[cw_serde]
pub struct GenesisGrant {
    pub granter: String,
    pub grantee: String,
    pub authorization: AnyMsg,
    pub expiration: Option<Timestamp>,
}

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    /// Grants already expired at genesis time are skipped.
    #[serde(default)]
    pub grants: Vec<GenesisGrant>,
}

fn validate_pair(api: &dyn Api, granter: &str, grantee: &str) -> Result<(), CoreError> {
    let granter = validate_addr(api, granter)?;
    let grantee = validate_addr(api, grantee)?;
    if granter == grantee {
        return Err(ContractError::GranteeIsGranter.into());
    }
    Ok(())
}

#[cw_serde]
pub struct MsgGrant {
    pub granter: String,
    pub grantee: String,
    pub grant: Grant,
}

impl TypeUrl for MsgGrant {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgGrant";
}

impl TypedMsg for MsgGrant {
    fn signers(&self) -> Vec<String> {
        vec![self.granter.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_pair(api, &self.granter, &self.grantee)
    }
}

#[cw_serde]
pub struct MsgRevoke {
    pub granter: String,
    pub grantee: String,
    pub msg_type_url: String,
}

impl TypeUrl for MsgRevoke {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgRevoke";
}

impl TypedMsg for MsgRevoke {
    fn signers(&self) -> Vec<String> {
        vec![self.granter.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_pair(api, &self.granter, &self.grantee)?;
        if self.msg_type_url.is_empty() {
            return Err(ContractError::InvalidAuthorization {
                reason: "message type url must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Runs `msgs` in order. Each message is signed either by `grantee` itself
/// or by a granter who granted `grantee` an authorization for its type.
#[cw_serde]
pub struct MsgExec {
    pub grantee: String,
    pub msgs: Vec<AnyMsg>,
}

impl TypeUrl for MsgExec {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgExec";
}

impl TypedMsg for MsgExec {
    fn signers(&self) -> Vec<String> {
        vec![self.grantee.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.grantee)?;
        if self.msgs.is_empty() {
            return Err(ContractError::EmptyMsgs.into());
        }
        Ok(())
    }
}

pub enum ExecuteMsg {
    Grant(MsgGrant),
    Revoke(MsgRevoke),
    Exec(MsgExec),
}

impl ExecuteMsg {
    pub const TYPE_URLS: [&'static str; 3] =
        [MsgGrant::TYPE_URL, MsgRevoke::TYPE_URL, MsgExec::TYPE_URL];

    pub fn from_any(msg: &AnyMsg) -> Result<Self, CoreError> {
        match msg.type_url.as_str() {
            t if t == MsgGrant::TYPE_URL => Ok(ExecuteMsg::Grant(MsgGrant::from_any(msg)?)),
            t if t == MsgRevoke::TYPE_URL => Ok(ExecuteMsg::Revoke(MsgRevoke::from_any(msg)?)),
            t if t == MsgExec::TYPE_URL => Ok(ExecuteMsg::Exec(MsgExec::from_any(msg)?)),
            other => Err(CoreError::UnregisteredMsg {
                type_url: other.to_string(),
            }),
        }
    }

    pub fn signers(&self) -> Vec<String> {
        match self {
            ExecuteMsg::Grant(msg) => msg.signers(),
            ExecuteMsg::Revoke(msg) => msg.signers(),
            ExecuteMsg::Exec(msg) => msg.signers(),
        }
    }

    pub fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        match self {
            ExecuteMsg::Grant(msg) => msg.validate_basic(api),
            ExecuteMsg::Revoke(msg) => msg.validate_basic(api),
            ExecuteMsg::Exec(msg) => msg.validate_basic(api),
        }
    }
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Grants from `granter` to `grantee`, or the single grant for
    /// `msg_type_url` when given. Paginated by type url.
    #[returns(GrantsResponse)]
    Grants {
        granter: String,
        grantee: String,
        msg_type_url: Option<String>,
        start_after: Option<String>,
        limit: Option<u32>,
    },

    /// Every grant issued by `granter`, ordered by (grantee, type url).
    #[returns(GrantsResponse)]
    GranterGrants {
        granter: String,
        start_after: Option<(String, String)>,
        limit: Option<u32>,
    },

    /// Every grant held by `grantee`, ordered by (granter, type url).
    #[returns(GrantsResponse)]
    GranteeGrants {
        grantee: String,
        start_after: Option<(String, String)>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct GrantAuthorization {
    pub granter: String,
    pub grantee: String,
    pub msg_type_url: String,
    pub authorization: AnyMsg,
    pub expiration: Option<Timestamp>,
}

#[cw_serde]
pub struct GrantsResponse {
    pub grants: Vec<GrantAuthorization>,
}

/// `data` of a successful `MsgExec`: one entry per executed message.
#[cw_serde]
pub struct ExecResponse {
    pub results: Vec<Binary>,
}
