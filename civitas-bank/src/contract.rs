use std::collections::BTreeSet;

use civitas_core::coins::{coins_to_string, normalize, validate_coins};
use civitas_core::keepers::BankKeeper;
use civitas_core::versions::set_module_version;
use cosmwasm_std::{to_json_binary, Binary, Coin, Deps, DepsMut, Env, Response, StdResult};

use crate::error::ContractError;
use crate::module::BankModule;
use crate::msg::{
    AllBalancesResponse, BalanceResponse, ExecuteMsg, InstantiateMsg, MsgSend, MsgSetSendEnabled,
    QueryMsg, SendEnabledResponse, SupplyResponse,
};

const CONTRACT_NAME: &str = "crates.io:civitas-bank";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Instantiate ──────────────────────────────────────────────────────

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    bank: &BankModule,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_module_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    for balance in &msg.balances {
        let address = deps.api.addr_validate(&balance.address)?;
        let coins = normalize(&balance.coins)?;
        validate_coins(&coins)?;
        bank.keeper.mint_coins(deps.storage, &address, &coins)?;
    }
    for entry in &msg.send_enabled {
        bank.keeper
            .set_send_enabled(deps.storage, &entry.denom, entry.enabled)?;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("module", "bank"))
}

// ─── Execute ──────────────────────────────────────────────────────────

pub fn execute(
    deps: DepsMut,
    env: &Env,
    bank: &BankModule,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Send(msg) => execute_send(deps, env, bank, msg),
        ExecuteMsg::SetSendEnabled(msg) => execute_set_send_enabled(deps, bank, msg),
    }
}

fn execute_send(
    deps: DepsMut,
    _env: &Env,
    bank: &BankModule,
    msg: MsgSend,
) -> Result<Response, ContractError> {
    if msg.amount.is_empty() {
        return Err(ContractError::EmptyAmount);
    }
    let from = deps.api.addr_validate(&msg.from_address)?;
    let to = deps.api.addr_validate(&msg.to_address)?;

    bank.keeper.is_send_enabled_coins(deps.storage, &msg.amount)?;
    bank.keeper.send_coins(deps.storage, &from, &to, &msg.amount)?;

    Ok(Response::new()
        .add_attribute("action", "send")
        .add_attribute("sender", from)
        .add_attribute("recipient", to)
        .add_attribute("amount", coins_to_string(&msg.amount)))
}

fn execute_set_send_enabled(
    deps: DepsMut,
    bank: &BankModule,
    msg: MsgSetSendEnabled,
) -> Result<Response, ContractError> {
    let authority = deps.api.addr_validate(&msg.authority)?;
    if authority != bank.authority {
        return Err(ContractError::Unauthorized {
            role: "bank authority".to_string(),
        });
    }

    let mut seen = BTreeSet::new();
    for entry in &msg.send_enabled {
        if !seen.insert(entry.denom.as_str()) {
            return Err(ContractError::DuplicateDenom {
                denom: entry.denom.clone(),
            });
        }
    }
    for entry in &msg.send_enabled {
        bank.keeper
            .set_send_enabled(deps.storage, &entry.denom, entry.enabled)?;
    }

    Ok(Response::new()
        .add_attribute("action", "set_send_enabled")
        .add_attribute("count", msg.send_enabled.len().to_string()))
}

// ─── Query ────────────────────────────────────────────────────────────

pub fn query(deps: Deps, _env: Env, bank: &BankModule, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Balance { address, denom } => {
            let address = deps.api.addr_validate(&address)?;
            let amount = bank.keeper.balance(deps.storage, &address, &denom)?;
            to_json_binary(&BalanceResponse {
                amount: Coin::new(amount, denom),
            })
        }
        QueryMsg::AllBalances { address } => {
            let address = deps.api.addr_validate(&address)?;
            to_json_binary(&AllBalancesResponse {
                balances: bank.keeper.all_balances(deps.storage, &address)?,
            })
        }
        QueryMsg::Supply { denom } => to_json_binary(&SupplyResponse {
            amount: bank.keeper.supply_of(deps.storage, &denom)?,
        }),
        QueryMsg::SendEnabled { denom } => to_json_binary(&SendEnabledResponse {
            enabled: bank.keeper.is_send_enabled(deps.storage, &denom)?,
            denom,
        }),
    }
}
