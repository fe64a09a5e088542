use civitas_core::coins::validate_coins;
use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl, TypedMsg};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Api, Coin, Uint128};

#[cw_serde]
pub struct Balance {
    pub address: String,
    pub coins: Vec<Coin>,
}

#[cw_serde]
pub struct SendEnabled {
    pub denom: String,
    pub enabled: bool,
}

/// Genesis balances. Every listed coin is minted into supply.
#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    pub balances: Vec<Balance>,
    pub send_enabled: Vec<SendEnabled>,
}

#[cw_serde]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

impl TypeUrl for MsgSend {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgSend";
}

impl TypedMsg for MsgSend {
    fn signers(&self) -> Vec<String> {
        vec![self.from_address.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.from_address)?;
        validate_addr(api, &self.to_address)?;
        if self.amount.is_empty() {
            return Err(CoreError::InvalidCoins {
                reason: "send amount must not be empty".to_string(),
            });
        }
        validate_coins(&self.amount)
    }
}

/// Toggles transfers per denom. Only the bank authority may send it.
#[cw_serde]
pub struct MsgSetSendEnabled {
    pub authority: String,
    pub send_enabled: Vec<SendEnabled>,
}

impl TypeUrl for MsgSetSendEnabled {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgSetSendEnabled";
}

impl TypedMsg for MsgSetSendEnabled {
    fn signers(&self) -> Vec<String> {
        vec![self.authority.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.authority)?;
        Ok(())
    }
}

pub enum ExecuteMsg {
    Send(MsgSend),
    SetSendEnabled(MsgSetSendEnabled),
}

impl ExecuteMsg {
    pub const TYPE_URLS: [&'static str; 2] = [MsgSend::TYPE_URL, MsgSetSendEnabled::TYPE_URL];

    pub fn from_any(msg: &AnyMsg) -> Result<Self, CoreError> {
        match msg.type_url.as_str() {
            t if t == MsgSend::TYPE_URL => Ok(ExecuteMsg::Send(MsgSend::from_any(msg)?)),
            t if t == MsgSetSendEnabled::TYPE_URL => {
                Ok(ExecuteMsg::SetSendEnabled(MsgSetSendEnabled::from_any(msg)?))
            }
            other => Err(CoreError::UnregisteredMsg {
                type_url: other.to_string(),
            }),
        }
    }

    pub fn signers(&self) -> Vec<String> {
        match self {
            ExecuteMsg::Send(msg) => msg.signers(),
            ExecuteMsg::SetSendEnabled(msg) => msg.signers(),
        }
    }

    pub fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        match self {
            ExecuteMsg::Send(msg) => msg.validate_basic(api),
            ExecuteMsg::SetSendEnabled(msg) => msg.validate_basic(api),
        }
    }
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(BalanceResponse)]
    Balance { address: String, denom: String },

    #[returns(AllBalancesResponse)]
    AllBalances { address: String },

    #[returns(SupplyResponse)]
    Supply { denom: String },

    #[returns(SendEnabledResponse)]
    SendEnabled { denom: String },
}

#[cw_serde]
pub struct BalanceResponse {
    pub amount: Coin,
}

#[cw_serde]
pub struct AllBalancesResponse {
    pub balances: Vec<Coin>,
}

#[cw_serde]
pub struct SupplyResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct SendEnabledResponse {
    pub denom: String,
    pub enabled: bool,
}
