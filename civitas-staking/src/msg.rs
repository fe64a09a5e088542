use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl, TypedMsg};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Api, Coin, Uint128};

use crate::state::{Delegation, Validator};

#[cw_serde]
pub struct GenesisValidator {
    pub operator: String,
    /// Self-delegation minted into the bonded pool at genesis.
    pub self_delegation: Uint128,
    #[serde(default = "default_bonded")]
    pub bonded: bool,
}

fn default_bonded() -> bool {
    true
}

#[cw_serde]
pub struct GenesisDelegation {
    pub delegator: String,
    pub validator: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct InstantiateMsg {
    pub bond_denom: String,
    pub validators: Vec<GenesisValidator>,
    #[serde(default)]
    pub delegations: Vec<GenesisDelegation>,
}

#[cw_serde]
pub struct MsgDelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

impl TypeUrl for MsgDelegate {
    const TYPE_URL: &'static str = "/cosmos.staking.v1beta1.MsgDelegate";
}

impl TypedMsg for MsgDelegate {
    fn signers(&self) -> Vec<String> {
        vec![self.delegator_address.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.delegator_address)?;
        validate_addr(api, &self.validator_address)?;
        if self.amount.amount.is_zero() {
            return Err(CoreError::InvalidCoins {
                reason: "delegation amount must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cw_serde]
pub struct MsgUndelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

impl TypeUrl for MsgUndelegate {
    const TYPE_URL: &'static str = "/cosmos.staking.v1beta1.MsgUndelegate";
}

impl TypedMsg for MsgUndelegate {
    fn signers(&self) -> Vec<String> {
        vec![self.delegator_address.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.delegator_address)?;
        validate_addr(api, &self.validator_address)?;
        if self.amount.amount.is_zero() {
            return Err(CoreError::InvalidCoins {
                reason: "undelegation amount must be positive".to_string(),
            });
        }
        Ok(())
    }
}

pub enum ExecuteMsg {
    Delegate(MsgDelegate),
    Undelegate(MsgUndelegate),
}

impl ExecuteMsg {
    pub const TYPE_URLS: [&'static str; 2] = [MsgDelegate::TYPE_URL, MsgUndelegate::TYPE_URL];

    pub fn from_any(msg: &AnyMsg) -> Result<Self, CoreError> {
        match msg.type_url.as_str() {
            t if t == MsgDelegate::TYPE_URL => Ok(ExecuteMsg::Delegate(MsgDelegate::from_any(msg)?)),
            t if t == MsgUndelegate::TYPE_URL => {
                Ok(ExecuteMsg::Undelegate(MsgUndelegate::from_any(msg)?))
            }
            other => Err(CoreError::UnregisteredMsg {
                type_url: other.to_string(),
            }),
        }
    }

    pub fn signers(&self) -> Vec<String> {
        match self {
            ExecuteMsg::Delegate(msg) => msg.signers(),
            ExecuteMsg::Undelegate(msg) => msg.signers(),
        }
    }

    pub fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        match self {
            ExecuteMsg::Delegate(msg) => msg.validate_basic(api),
            ExecuteMsg::Undelegate(msg) => msg.validate_basic(api),
        }
    }
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ValidatorResponse)]
    Validator { address: String },

    #[returns(ValidatorsResponse)]
    Validators {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(DelegationResponse)]
    Delegation { delegator: String, validator: String },

    #[returns(DelegationsResponse)]
    Delegations { delegator: String },

    #[returns(TotalBondedResponse)]
    TotalBonded {},
}

#[cw_serde]
pub struct ValidatorResponse {
    pub validator: Option<Validator>,
}

#[cw_serde]
pub struct ValidatorsResponse {
    pub validators: Vec<Validator>,
}

#[cw_serde]
pub struct DelegationResponse {
    pub delegation: Option<Delegation>,
}

#[cw_serde]
pub struct DelegationsResponse {
    pub delegations: Vec<Delegation>,
}

#[cw_serde]
pub struct TotalBondedResponse {
    pub amount: Uint128,
}
