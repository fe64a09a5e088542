use civitas_core::keepers::StakingKeeper;
use civitas_core::versions::set_module_version;
use cosmwasm_std::{
    to_json_binary, Addr, Binary, Coin, Decimal256, Deps, DepsMut, Env, Order, Response,
    StdResult, Storage, Uint128,
};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::module::StakingModule;
use crate::msg::{
    DelegationResponse, DelegationsResponse, ExecuteMsg, InstantiateMsg, MsgDelegate,
    MsgUndelegate, QueryMsg, TotalBondedResponse, ValidatorResponse, ValidatorsResponse,
};
use crate::state::{BondStatus, Validator, BOND_DENOM, DELEGATIONS, VALIDATORS};

const CONTRACT_NAME: &str = "crates.io:civitas-staking";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Instantiate ──────────────────────────────────────────────────────

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    staking: &StakingModule,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_module_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    BOND_DENOM.save(deps.storage, &msg.bond_denom)?;

    for genesis in &msg.validators {
        let operator = deps.api.addr_validate(&genesis.operator)?;
        if VALIDATORS.has(deps.storage, &operator) {
            return Err(ContractError::ValidatorExists {
                address: operator.to_string(),
            });
        }
        let status = if genesis.bonded {
            BondStatus::Bonded
        } else {
            BondStatus::Unbonded
        };
        VALIDATORS.save(
            deps.storage,
            &operator,
            &Validator {
                operator: operator.clone(),
                tokens: Uint128::zero(),
                delegator_shares: Decimal256::zero(),
                status,
            },
        )?;
        if !genesis.self_delegation.is_zero() {
            bond_at_genesis(
                deps.storage,
                staking,
                &msg.bond_denom,
                &operator,
                &operator,
                genesis.self_delegation,
            )?;
        }
    }

    for genesis in &msg.delegations {
        let delegator = deps.api.addr_validate(&genesis.delegator)?;
        let validator = deps.api.addr_validate(&genesis.validator)?;
        bond_at_genesis(
            deps.storage,
            staking,
            &msg.bond_denom,
            &delegator,
            &validator,
            genesis.amount,
        )?;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("module", "staking")
        .add_attribute("validators", msg.validators.len().to_string()))
}

fn bond_at_genesis(
    store: &mut dyn Storage,
    staking: &StakingModule,
    denom: &str,
    delegator: &Addr,
    validator: &Addr,
    amount: Uint128,
) -> Result<(), ContractError> {
    staking
        .bank
        .mint_coins(store, &staking.bonded_pool, &[Coin::new(amount, denom)])?;
    staking.keeper.delegate(store, delegator, validator, amount)?;
    Ok(())
}

// ─── Execute ──────────────────────────────────────────────────────────

pub fn execute(
    deps: DepsMut,
    _env: &Env,
    staking: &StakingModule,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Delegate(msg) => execute_delegate(deps, staking, msg),
        ExecuteMsg::Undelegate(msg) => execute_undelegate(deps, staking, msg),
    }
}

fn assert_bond_denom(store: &dyn Storage, coin: &Coin) -> Result<(), ContractError> {
    let denom = BOND_DENOM.load(store)?;
    if coin.denom != denom {
        return Err(ContractError::InvalidDenom {
            expected: denom,
            got: coin.denom.clone(),
        });
    }
    Ok(())
}

fn execute_delegate(
    deps: DepsMut,
    staking: &StakingModule,
    msg: MsgDelegate,
) -> Result<Response, ContractError> {
    assert_bond_denom(deps.storage, &msg.amount)?;
    let delegator = deps.api.addr_validate(&msg.delegator_address)?;
    let validator = deps.api.addr_validate(&msg.validator_address)?;

    staking.bank.send_coins(
        deps.storage,
        &delegator,
        &staking.bonded_pool,
        &[msg.amount.clone()],
    )?;
    let shares = staking
        .keeper
        .delegate(deps.storage, &delegator, &validator, msg.amount.amount)?;

    Ok(Response::new()
        .add_attribute("action", "delegate")
        .add_attribute("delegator", delegator)
        .add_attribute("validator", validator)
        .add_attribute("amount", msg.amount.to_string())
        .add_attribute("new_shares", shares.to_string()))
}

fn execute_undelegate(
    deps: DepsMut,
    staking: &StakingModule,
    msg: MsgUndelegate,
) -> Result<Response, ContractError> {
    assert_bond_denom(deps.storage, &msg.amount)?;
    let delegator = deps.api.addr_validate(&msg.delegator_address)?;
    let validator = deps.api.addr_validate(&msg.validator_address)?;

    let shares = staking
        .keeper
        .undelegate(deps.storage, &delegator, &validator, msg.amount.amount)?;
    staking.bank.send_coins(
        deps.storage,
        &staking.bonded_pool,
        &delegator,
        &[msg.amount.clone()],
    )?;

    Ok(Response::new()
        .add_attribute("action", "undelegate")
        .add_attribute("delegator", delegator)
        .add_attribute("validator", validator)
        .add_attribute("amount", msg.amount.to_string())
        .add_attribute("shares", shares.to_string()))
}

// ─── Query ────────────────────────────────────────────────────────────

pub fn query(deps: Deps, _env: Env, staking: &StakingModule, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Validator { address } => {
            let address = deps.api.addr_validate(&address)?;
            to_json_binary(&ValidatorResponse {
                validator: VALIDATORS.may_load(deps.storage, &address)?,
            })
        }
        QueryMsg::Validators { start_after, limit } => {
            query_validators(deps, start_after, limit)
        }
        QueryMsg::Delegation {
            delegator,
            validator,
        } => {
            let delegator = deps.api.addr_validate(&delegator)?;
            let validator = deps.api.addr_validate(&validator)?;
            to_json_binary(&DelegationResponse {
                delegation: DELEGATIONS.may_load(deps.storage, (&delegator, &validator))?,
            })
        }
        QueryMsg::Delegations { delegator } => {
            let delegator = deps.api.addr_validate(&delegator)?;
            let delegations = DELEGATIONS
                .prefix(&delegator)
                .range(deps.storage, None, None, Order::Ascending)
                .map(|r| r.map(|(_, d)| d))
                .collect::<StdResult<_>>()?;
            to_json_binary(&DelegationsResponse { delegations })
        }
        QueryMsg::TotalBonded {} => to_json_binary(&TotalBondedResponse {
            amount: staking.keeper.total_bonded_tokens(deps.storage)?,
        }),
    }
}

fn query_validators(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after
        .as_ref()
        .map(|s| deps.api.addr_validate(s))
        .transpose()?;
    let start_bound = start.as_ref().map(Bound::exclusive);

    let validators = VALIDATORS
        .range(deps.storage, start_bound, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, v)| v))
        .collect::<StdResult<_>>()?;
    to_json_binary(&ValidatorsResponse { validators })
}
