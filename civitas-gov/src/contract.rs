use civitas_core::coins::{
    add_coins, amount_of, coins_to_string, denoms_subset_of, is_all_gte, mul_dec_truncate,
    normalize, sub_coins, validate_coins,
};
use civitas_core::router::response_events;
use civitas_core::store::with_branch;
use civitas_core::versions::set_module_version;
use civitas_core::{AnyMsg, CoreError, Router};
use cosmwasm_std::{
    to_json_binary, Addr, Api, Binary, Coin, Decimal, Deps, DepsMut, Env, Event, Order,
    Response, StdError, StdResult, Storage, Timestamp, Uint128,
};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::helpers::{
    deposit_event, executed_event, load_proposal, options_to_string, period_end,
    status_changed_event, validate_vote_options,
};
use crate::module::GovModule;
use crate::msg::{
    DepositResponse, DepositsResponse, ExecuteMsg, InstantiateMsg, MsgCancelProposal, MsgDeposit,
    MsgSubmitProposal, MsgUpdateParams, ParamsResponse, ProposalResponse, ProposalsResponse,
    QueryMsg, SubmitProposalResponse, TallyResultResponse, VoteResponse, VotesResponse,
};
use crate::params::Params;
use crate::state::{
    Deposit, Proposal, ProposalStatus, TallyResult, Vote, WeightedVoteOption,
    ACTIVE_QUEUE, DEPOSITS, INACTIVE_QUEUE, PARAMS, PROPOSALS, PROPOSAL_ID, VOTES,
};
use crate::tally::tally;

const CONTRACT_NAME: &str = "crates.io:civitas-gov";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const CANCELED_REASON: &str = "canceled by proposer";

// ─── Instantiate ──────────────────────────────────────────────────────

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    gov: &GovModule,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_module_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    msg.params.validate(deps.api)?;
    PARAMS.save(deps.storage, &msg.params)?;

    let starting_id = msg.starting_proposal_id.unwrap_or(1);
    if starting_id == 0 {
        return Err(ContractError::InvalidParams {
            reason: "starting proposal id must be positive".to_string(),
        });
    }
    PROPOSAL_ID.save(deps.storage, &starting_id)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("module", "gov")
        .add_attribute("authority", gov.config.authority.as_str()))
}

// ─── Execute ──────────────────────────────────────────────────────────

pub fn execute(
    deps: DepsMut,
    env: &Env,
    gov: &GovModule,
    router: &Router,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SubmitProposal(msg) => execute_submit_proposal(deps, env, gov, router, msg),
        ExecuteMsg::Deposit(msg) => execute_deposit(deps, env, gov, msg),
        ExecuteMsg::Vote(msg) => execute_vote(
            deps,
            gov,
            msg.proposal_id,
            &msg.voter,
            vec![WeightedVoteOption {
                option: msg.option,
                weight: Decimal::one(),
            }],
            msg.metadata,
        ),
        ExecuteMsg::VoteWeighted(msg) => execute_vote(
            deps,
            gov,
            msg.proposal_id,
            &msg.voter,
            msg.options,
            msg.metadata,
        ),
        ExecuteMsg::CancelProposal(msg) => execute_cancel_proposal(deps, env, gov, msg),
        ExecuteMsg::UpdateParams(msg) => execute_update_params(deps, gov, msg),
    }
}

fn validate_address(api: &dyn Api, address: &str) -> Result<Addr, ContractError> {
    api.addr_validate(address)
        .map_err(|_| ContractError::InvalidAddress {
            address: address.to_string(),
        })
}

// ─── Submit Proposal ──────────────────────────────────────────────────

/// A proposal message must be routable, pass its stateless checks and be
/// signed by the governance authority alone.
fn validate_proposal_msg(
    api: &dyn Api,
    router: &Router,
    authority: &Addr,
    index: usize,
    msg: &AnyMsg,
) -> Result<(), ContractError> {
    let invalid = |reason: String| ContractError::InvalidMessage {
        reason: format!("message {index} ({}): {reason}", msg.type_url),
    };
    if router.handler(&msg.type_url).is_none() {
        return Err(invalid("no handler registered".to_string()));
    }
    router
        .validate_basic(api, msg)
        .map_err(|err| invalid(err.to_string()))?;
    let signers = router
        .signers(api, msg)
        .map_err(|err| invalid(err.to_string()))?;
    if signers.len() != 1 || signers[0] != *authority {
        return Err(invalid(format!(
            "expected {authority} as the only signer"
        )));
    }
    Ok(())
}

/// Deposits may only use denoms that appear in the applicable min deposit.
fn check_deposit_denoms(amount: &[Coin], min_deposit: &[Coin]) -> Result<(), ContractError> {
    if !denoms_subset_of(amount, min_deposit) {
        return Err(ContractError::InvalidDeposit {
            reason: format!(
                "deposited {} but only {} denoms are accepted",
                coins_to_string(amount),
                coins_to_string(min_deposit)
            ),
        });
    }
    Ok(())
}

fn execute_submit_proposal(
    deps: DepsMut,
    env: &Env,
    gov: &GovModule,
    router: &Router,
    msg: MsgSubmitProposal,
) -> Result<Response, ContractError> {
    let proposer = validate_address(deps.api, &msg.proposer)?;

    if msg.metadata.len() > gov.config.max_metadata_len {
        return Err(ContractError::MetadataTooLong {
            max: gov.config.max_metadata_len as u64,
        });
    }
    if msg.title.len() > gov.config.max_title_len {
        return Err(ContractError::InvalidProposal {
            reason: format!("title longer than {} bytes", gov.config.max_title_len),
        });
    }
    if msg.summary.len() > gov.config.max_summary_len {
        return Err(ContractError::InvalidProposal {
            reason: format!("summary longer than {} bytes", gov.config.max_summary_len),
        });
    }
    for (index, any) in msg.messages.iter().enumerate() {
        validate_proposal_msg(deps.api, router, &gov.config.authority, index, any)?;
    }

    let params = PARAMS.load(deps.storage)?;
    let initial_deposit = normalize(&msg.initial_deposit)?;
    validate_coins(&initial_deposit)?;
    let min_deposit = params.min_deposit_for(msg.expedited);
    check_deposit_denoms(&initial_deposit, min_deposit)?;
    let required = mul_dec_truncate(min_deposit, params.min_initial_deposit_ratio)?;
    if !is_all_gte(&initial_deposit, &required) {
        return Err(ContractError::InsufficientInitialDeposit {
            required: coins_to_string(&required),
            got: coins_to_string(&initial_deposit),
        });
    }

    if !initial_deposit.is_empty() {
        gov.bank.send_coins(
            deps.storage,
            &proposer,
            &gov.config.module_account,
            &initial_deposit,
        )?;
    }

    let id = PROPOSAL_ID.load(deps.storage)?;
    let next_id = id
        .checked_add(1)
        .ok_or_else(|| StdError::generic_err("proposal id overflow"))?;
    PROPOSAL_ID.save(deps.storage, &next_id)?;

    let deposit_end_time = period_end(env.block.time, params.max_deposit_period)?;
    let mut proposal = Proposal {
        id,
        messages: msg.messages,
        status: ProposalStatus::DepositPeriod,
        final_tally: TallyResult::default(),
        submit_time: env.block.time,
        deposit_end_time,
        total_deposit: vec![],
        voting_start_time: None,
        voting_end_time: None,
        metadata: msg.metadata,
        title: msg.title,
        summary: msg.summary,
        proposer: proposer.clone(),
        expedited: msg.expedited,
        failed_reason: String::new(),
    };
    PROPOSALS.save(deps.storage, id, &proposal)?;
    INACTIVE_QUEUE.insert(deps.storage, deposit_end_time, id)?;

    let mut events = vec![Event::new("proposal_submitted")
        .add_attribute("proposal_id", id.to_string())
        .add_attribute("proposer", proposer.as_str())];
    if !initial_deposit.is_empty() {
        events.extend(record_deposit(
            deps.storage,
            env,
            &params,
            &mut proposal,
            &proposer,
            &initial_deposit,
        )?);
    }

    tracing::info!(
        target: "gov",
        proposal_id = id,
        proposer = %proposer,
        expedited = proposal.expedited,
        messages = proposal.messages.len(),
        "proposal submitted"
    );

    Ok(Response::new()
        .add_attribute("action", "submit_proposal")
        .add_attribute("proposal_id", id.to_string())
        .add_events(events)
        .set_data(to_json_binary(&SubmitProposalResponse { proposal_id: id })?))
}

// ─── Deposit ──────────────────────────────────────────────────────────

fn execute_deposit(
    deps: DepsMut,
    env: &Env,
    gov: &GovModule,
    msg: MsgDeposit,
) -> Result<Response, ContractError> {
    let depositor = validate_address(deps.api, &msg.depositor)?;
    let mut proposal = load_proposal(deps.storage, msg.proposal_id)?;
    if proposal.status != ProposalStatus::DepositPeriod {
        return Err(ContractError::InactiveProposal { id: proposal.id });
    }

    let params = PARAMS.load(deps.storage)?;
    let amount = normalize(&msg.amount)?;
    validate_coins(&amount)?;
    if amount.is_empty() {
        return Err(ContractError::InvalidDeposit {
            reason: "deposit amount must not be empty".to_string(),
        });
    }
    let min_deposit = params.min_deposit_for(proposal.expedited);
    check_deposit_denoms(&amount, min_deposit)?;
    if !params.min_deposit_ratio.is_zero() {
        let floor = mul_dec_truncate(min_deposit, params.min_deposit_ratio)?;
        for coin in &amount {
            let required = amount_of(&floor, &coin.denom);
            if coin.amount < required {
                return Err(ContractError::InvalidDeposit {
                    reason: format!(
                        "{}{} is below the minimum single deposit of {}{}",
                        coin.amount, coin.denom, required, coin.denom
                    ),
                });
            }
        }
    }

    gov.bank
        .send_coins(deps.storage, &depositor, &gov.config.module_account, &amount)?;
    let events = record_deposit(deps.storage, env, &params, &mut proposal, &depositor, &amount)?;

    Ok(Response::new()
        .add_attribute("action", "deposit")
        .add_attribute("proposal_id", proposal.id.to_string())
        .add_attribute("depositor", depositor.as_str())
        .add_events(events))
}

/// Books `amount` (already escrowed) against `proposal` and starts voting
/// once the total meets the min deposit. Saves the proposal.
fn record_deposit(
    store: &mut dyn Storage,
    env: &Env,
    params: &Params,
    proposal: &mut Proposal,
    depositor: &Addr,
    amount: &[Coin],
) -> Result<Vec<Event>, ContractError> {
    let deposit = match DEPOSITS.may_load(store, (proposal.id, depositor))? {
        Some(mut existing) => {
            existing.amount = add_coins(&existing.amount, amount)?;
            existing
        }
        None => Deposit {
            proposal_id: proposal.id,
            depositor: depositor.clone(),
            amount: amount.to_vec(),
        },
    };
    DEPOSITS.save(store, (proposal.id, depositor), &deposit)?;
    proposal.total_deposit = add_coins(&proposal.total_deposit, amount)?;

    let mut events = vec![deposit_event(proposal.id, depositor.as_str(), amount)];
    if proposal.status == ProposalStatus::DepositPeriod
        && is_all_gte(
            &proposal.total_deposit,
            params.min_deposit_for(proposal.expedited),
        )
    {
        events.push(activate_voting(store, env, params, proposal)?);
    }
    PROPOSALS.save(store, proposal.id, proposal)?;
    Ok(events)
}

/// Moves the proposal from the inactive to the active queue. The caller
/// saves the proposal.
fn activate_voting(
    store: &mut dyn Storage,
    env: &Env,
    params: &Params,
    proposal: &mut Proposal,
) -> Result<Event, ContractError> {
    INACTIVE_QUEUE.remove(store, proposal.deposit_end_time, proposal.id);

    let start = env.block.time;
    let end = period_end(start, params.voting_period_for(proposal.expedited))?;
    proposal.voting_start_time = Some(start);
    proposal.voting_end_time = Some(end);
    let old = std::mem::replace(&mut proposal.status, ProposalStatus::VotingPeriod);
    ACTIVE_QUEUE.insert(store, end, proposal.id)?;

    tracing::info!(
        target: "gov",
        proposal_id = proposal.id,
        voting_end = %end,
        "voting period started"
    );
    Ok(status_changed_event(proposal.id, &old, &proposal.status))
}

// ─── Vote ─────────────────────────────────────────────────────────────

fn execute_vote(
    deps: DepsMut,
    gov: &GovModule,
    proposal_id: u64,
    voter: &str,
    options: Vec<WeightedVoteOption>,
    metadata: String,
) -> Result<Response, ContractError> {
    let voter = validate_address(deps.api, voter)?;
    if metadata.len() > gov.config.max_metadata_len {
        return Err(ContractError::MetadataTooLong {
            max: gov.config.max_metadata_len as u64,
        });
    }
    validate_vote_options(&options)?;

    let proposal = load_proposal(deps.storage, proposal_id)?;
    if proposal.status != ProposalStatus::VotingPeriod {
        return Err(ContractError::InactiveProposal { id: proposal_id });
    }

    let rendered = options_to_string(&options);
    // Later votes replace earlier ones.
    VOTES.save(
        deps.storage,
        (proposal_id, &voter),
        &Vote {
            proposal_id,
            voter: voter.clone(),
            options,
            metadata,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "vote")
        .add_attribute("proposal_id", proposal_id.to_string())
        .add_attribute("voter", voter.as_str())
        .add_event(
            Event::new("proposal_vote")
                .add_attribute("proposal_id", proposal_id.to_string())
                .add_attribute("voter", voter.as_str())
                .add_attribute("options", rendered),
        ))
}

// ─── Cancel Proposal ──────────────────────────────────────────────────

fn corrupted(reason: impl Into<String>) -> ContractError {
    ContractError::Corrupted {
        reason: reason.into(),
    }
}

/// Start and end of the period the proposal is currently in.
fn current_period(proposal: &Proposal) -> Result<(Timestamp, Timestamp), ContractError> {
    match proposal.status {
        ProposalStatus::DepositPeriod => Ok((proposal.submit_time, proposal.deposit_end_time)),
        ProposalStatus::VotingPeriod => {
            match (proposal.voting_start_time, proposal.voting_end_time) {
                (Some(start), Some(end)) => Ok((start, end)),
                _ => Err(corrupted(format!(
                    "proposal {} is voting without voting times",
                    proposal.id
                ))),
            }
        }
        _ => Err(ContractError::InactiveProposal { id: proposal.id }),
    }
}

fn execute_cancel_proposal(
    deps: DepsMut,
    env: &Env,
    gov: &GovModule,
    msg: MsgCancelProposal,
) -> Result<Response, ContractError> {
    let proposer = validate_address(deps.api, &msg.proposer)?;
    let mut proposal = load_proposal(deps.storage, msg.proposal_id)?;
    if proposal.proposer != proposer {
        return Err(ContractError::Unauthorized {
            expected: proposal.proposer.to_string(),
            got: proposer.to_string(),
        });
    }
    let (start, end) = current_period(&proposal)?;

    let params = PARAMS.load(deps.storage)?;
    let period = Uint128::from(end.nanos().saturating_sub(start.nanos()));
    let cutoff = period
        .checked_mul_floor(params.proposal_cancel_max_period)
        .map_err(|err| StdError::generic_err(err.to_string()))?;
    let elapsed = Uint128::from(env.block.time.nanos().saturating_sub(start.nanos()));
    if elapsed >= cutoff {
        return Err(ContractError::CancelPeriodEnded { id: proposal.id });
    }

    let destination = if params.proposal_cancel_dest.is_empty() {
        None
    } else {
        Some(validate_address(deps.api, &params.proposal_cancel_dest)?)
    };
    proposal.failed_reason = CANCELED_REASON.to_string();
    let status_event = finalize(
        deps.storage,
        gov,
        &mut proposal,
        ProposalStatus::Rejected,
        TallyResult::default(),
        DepositOutcome::Cancel {
            burn_ratio: params.proposal_cancel_ratio,
            destination,
        },
    )?;

    tracing::info!(target: "gov", proposal_id = proposal.id, "proposal canceled by proposer");

    Ok(Response::new()
        .add_attribute("action", "cancel_proposal")
        .add_attribute("proposal_id", proposal.id.to_string())
        .add_event(
            Event::new("proposal_canceled")
                .add_attribute("proposal_id", proposal.id.to_string())
                .add_attribute("proposer", proposer.as_str()),
        )
        .add_event(status_event))
}

// ─── Update Params ────────────────────────────────────────────────────

fn execute_update_params(
    deps: DepsMut,
    gov: &GovModule,
    msg: MsgUpdateParams,
) -> Result<Response, ContractError> {
    let authority = validate_address(deps.api, &msg.authority)?;
    if authority != gov.config.authority {
        return Err(ContractError::Unauthorized {
            expected: gov.config.authority.to_string(),
            got: authority.to_string(),
        });
    }
    msg.params.validate(deps.api)?;
    PARAMS.save(deps.storage, &msg.params)?;

    tracing::info!(target: "gov", "params updated");
    Ok(Response::new().add_attribute("action", "update_params"))
}

// ─── Finalize ─────────────────────────────────────────────────────────

/// What happens to the escrowed deposits of a proposal leaving the
/// non-terminal states.
pub enum DepositOutcome {
    Refund,
    Burn,
    /// Burn `burn_ratio` of each deposit; the remainder goes to
    /// `destination`, or back to the depositor when unset.
    Cancel {
        burn_ratio: Decimal,
        destination: Option<Addr>,
    },
}

fn settle_deposits(
    store: &mut dyn Storage,
    gov: &GovModule,
    proposal_id: u64,
    outcome: &DepositOutcome,
) -> Result<(), ContractError> {
    let escrow = &gov.config.module_account;
    let deposits: Vec<Deposit> = DEPOSITS
        .prefix(proposal_id)
        .range(store, None, None, Order::Ascending)
        .map(|item| item.map(|(_, deposit)| deposit))
        .collect::<StdResult<_>>()?;

    for deposit in deposits {
        match outcome {
            DepositOutcome::Refund => {
                gov.bank
                    .send_coins(store, escrow, &deposit.depositor, &deposit.amount)?;
            }
            DepositOutcome::Burn => {
                gov.bank.burn_coins(store, escrow, &deposit.amount)?;
            }
            DepositOutcome::Cancel {
                burn_ratio,
                destination,
            } => {
                let burned = mul_dec_truncate(&deposit.amount, *burn_ratio)?;
                let remainder = sub_coins(&deposit.amount, &burned)?;
                if !burned.is_empty() {
                    gov.bank.burn_coins(store, escrow, &burned)?;
                }
                if !remainder.is_empty() {
                    let to = destination.as_ref().unwrap_or(&deposit.depositor);
                    gov.bank.send_coins(store, escrow, to, &remainder)?;
                }
            }
        }
        DEPOSITS.remove(store, (proposal_id, &deposit.depositor));
    }
    Ok(())
}

/// Moves a live proposal into a terminal status: settles and deletes its
/// deposits, deletes its votes, drops its queue entry and records the tally.
pub fn finalize(
    store: &mut dyn Storage,
    gov: &GovModule,
    proposal: &mut Proposal,
    status: ProposalStatus,
    final_tally: TallyResult,
    outcome: DepositOutcome,
) -> Result<Event, ContractError> {
    let id = proposal.id;
    if proposal.status.is_terminal() {
        return Err(ContractError::InactiveProposal { id });
    }
    settle_deposits(store, gov, id, &outcome)?;

    let voters: Vec<Addr> = VOTES
        .prefix(id)
        .keys(store, None, None, Order::Ascending)
        .collect::<StdResult<_>>()?;
    for voter in &voters {
        VOTES.remove(store, (id, voter));
    }

    match proposal.status {
        ProposalStatus::DepositPeriod => {
            INACTIVE_QUEUE.remove(store, proposal.deposit_end_time, id);
        }
        ProposalStatus::VotingPeriod => {
            if let Some(end) = proposal.voting_end_time {
                ACTIVE_QUEUE.remove(store, end, id);
            }
        }
        _ => {}
    }

    let old = std::mem::replace(&mut proposal.status, status);
    proposal.final_tally = final_tally;
    PROPOSALS.save(store, id, proposal)?;

    tracing::info!(
        target: "gov",
        proposal_id = id,
        old = %old,
        new = %proposal.status,
        "proposal finalized"
    );
    Ok(status_changed_event(id, &old, &proposal.status))
}

// ─── End Block ────────────────────────────────────────────────────────

/// Drops proposals whose deposit period ended without reaching the min
/// deposit, then tallies proposals whose voting period ended.
pub fn end_block(
    mut deps: DepsMut,
    env: &Env,
    gov: &GovModule,
    router: &Router,
) -> Result<Vec<Event>, ContractError> {
    let params = PARAMS.load(deps.storage)?;
    let now = env.block.time;
    let mut events = vec![];

    for (at, id) in INACTIVE_QUEUE.due(deps.storage, now)? {
        let proposal = PROPOSALS
            .may_load(deps.storage, id)?
            .ok_or_else(|| corrupted(format!("inactive queue holds missing proposal {id}")))?;

        let burn = params.burn_proposal_deposit_prevote;
        let outcome = if burn {
            DepositOutcome::Burn
        } else {
            DepositOutcome::Refund
        };
        settle_deposits(deps.storage, gov, id, &outcome)?;
        INACTIVE_QUEUE.remove(deps.storage, at, id);
        PROPOSALS.remove(deps.storage, id);

        tracing::info!(
            target: "gov",
            proposal_id = id,
            total_deposit = %coins_to_string(&proposal.total_deposit),
            burned = burn,
            "proposal dropped after deposit period"
        );
        events.push(
            Event::new("proposal_dropped")
                .add_attribute("proposal_id", id.to_string())
                .add_attribute("deposits", if burn { "burned" } else { "refunded" }),
        );
    }

    for (at, id) in ACTIVE_QUEUE.due(deps.storage, now)? {
        let mut proposal = PROPOSALS
            .may_load(deps.storage, id)?
            .ok_or_else(|| corrupted(format!("active queue holds missing proposal {id}")))?;
        if proposal.status != ProposalStatus::VotingPeriod {
            return Err(corrupted(format!(
                "active queue holds proposal {id} in status {}",
                proposal.status
            )));
        }

        let outcome = tally(deps.storage, gov.staking.as_ref(), &params, &proposal)?;
        tracing::debug!(
            target: "gov",
            proposal_id = id,
            passes = outcome.passes,
            yes = %outcome.tally.yes_count,
            abstain = %outcome.tally.abstain_count,
            no = %outcome.tally.no_count,
            no_with_veto = %outcome.tally.no_with_veto_count,
            "tallied"
        );

        if proposal.expedited && !outcome.passes {
            events.push(convert_expedited(deps.storage, &params, &mut proposal, at)?);
            continue;
        }

        let (status, deposits) = match (outcome.passes, outcome.burn_deposits) {
            (true, _) => (ProposalStatus::Passed, DepositOutcome::Refund),
            (false, true) => (ProposalStatus::Rejected, DepositOutcome::Burn),
            (false, false) => (ProposalStatus::Rejected, DepositOutcome::Refund),
        };
        events.push(finalize(
            deps.storage,
            gov,
            &mut proposal,
            status,
            outcome.tally,
            deposits,
        )?);

        if outcome.passes {
            events.extend(execute_proposal(deps.branch(), env, router, &mut proposal)?);
        }
    }

    Ok(events)
}

/// An expedited proposal that fails its short vote keeps its votes and
/// deposits and continues as a regular proposal.
fn convert_expedited(
    store: &mut dyn Storage,
    params: &Params,
    proposal: &mut Proposal,
    queued_at: Timestamp,
) -> Result<Event, ContractError> {
    let start = proposal
        .voting_start_time
        .ok_or_else(|| corrupted(format!("proposal {} has no voting start", proposal.id)))?;
    let end = period_end(start, params.voting_period)?;

    ACTIVE_QUEUE.remove(store, queued_at, proposal.id);
    proposal.expedited = false;
    proposal.voting_end_time = Some(end);
    ACTIVE_QUEUE.insert(store, end, proposal.id)?;
    PROPOSALS.save(store, proposal.id, proposal)?;

    tracing::info!(
        target: "gov",
        proposal_id = proposal.id,
        voting_end = %end,
        "expedited proposal converted to regular"
    );
    Ok(Event::new("proposal_converted")
        .add_attribute("proposal_id", proposal.id.to_string())
        .add_attribute("voting_end_time", end.to_string()))
}

/// Runs the messages of a passed proposal in one nested scope. Any failure
/// discards every write they made and marks the proposal `Failed`.
fn execute_proposal(
    mut deps: DepsMut,
    env: &Env,
    router: &Router,
    proposal: &mut Proposal,
) -> Result<Vec<Event>, ContractError> {
    let id = proposal.id;
    let messages = &proposal.messages;
    let result = with_branch(deps.branch(), |mut branch| {
        let mut out = vec![];
        for msg in messages {
            let res = router.dispatch(branch.branch(), env, msg)?;
            let module = router.handler(&msg.type_url).map_or("unknown", |m| m.name());
            out.extend(response_events(module, res));
        }
        Ok::<_, CoreError>(out)
    });

    match result {
        Ok(mut out) => {
            tracing::info!(target: "gov", proposal_id = id, "proposal executed");
            out.push(executed_event(id, true));
            Ok(out)
        }
        Err(err) => {
            let failure = ContractError::ProposalExecutionFailed {
                id,
                reason: err.to_string(),
            };
            let old = std::mem::replace(&mut proposal.status, ProposalStatus::Failed);
            proposal.failed_reason = failure.to_string();
            PROPOSALS.save(deps.storage, id, proposal)?;

            tracing::warn!(target: "gov", proposal_id = id, error = %failure, "proposal execution failed");
            Ok(vec![
                status_changed_event(id, &old, &proposal.status),
                executed_event(id, false).add_attribute("error", proposal.failed_reason.clone()),
            ])
        }
    }
}

// ─── Query ────────────────────────────────────────────────────────────

pub fn query(deps: Deps, _env: Env, gov: &GovModule, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Params {} => to_json_binary(&ParamsResponse {
            params: PARAMS.load(deps.storage)?,
        }),
        QueryMsg::Proposal { proposal_id } => to_json_binary(&ProposalResponse {
            proposal: query_load_proposal(deps, proposal_id)?,
        }),
        QueryMsg::Proposals {
            status,
            voter,
            depositor,
            start_after,
            limit,
        } => query_proposals(deps, status, voter, depositor, start_after, limit),
        QueryMsg::Vote { proposal_id, voter } => {
            let voter = deps.api.addr_validate(&voter)?;
            let vote = VOTES
                .may_load(deps.storage, (proposal_id, &voter))?
                .ok_or_else(|| {
                    StdError::generic_err(
                        ContractError::VoteNotFound {
                            id: proposal_id,
                            voter: voter.to_string(),
                        }
                        .to_string(),
                    )
                })?;
            to_json_binary(&VoteResponse { vote })
        }
        QueryMsg::Votes {
            proposal_id,
            start_after,
            limit,
        } => {
            let limit = limit.unwrap_or(30).min(100) as usize;
            let start = start_after
                .map(|addr| deps.api.addr_validate(&addr))
                .transpose()?;
            let votes = VOTES
                .prefix(proposal_id)
                .range(
                    deps.storage,
                    start.as_ref().map(Bound::exclusive),
                    None,
                    Order::Ascending,
                )
                .take(limit)
                .map(|item| item.map(|(_, vote)| vote))
                .collect::<StdResult<_>>()?;
            to_json_binary(&VotesResponse { votes })
        }
        QueryMsg::Deposit {
            proposal_id,
            depositor,
        } => {
            let depositor = deps.api.addr_validate(&depositor)?;
            let deposit = DEPOSITS
                .may_load(deps.storage, (proposal_id, &depositor))?
                .ok_or_else(|| {
                    StdError::generic_err(
                        ContractError::DepositNotFound {
                            id: proposal_id,
                            depositor: depositor.to_string(),
                        }
                        .to_string(),
                    )
                })?;
            to_json_binary(&DepositResponse { deposit })
        }
        QueryMsg::Deposits {
            proposal_id,
            start_after,
            limit,
        } => {
            let limit = limit.unwrap_or(30).min(100) as usize;
            let start = start_after
                .map(|addr| deps.api.addr_validate(&addr))
                .transpose()?;
            let deposits = DEPOSITS
                .prefix(proposal_id)
                .range(
                    deps.storage,
                    start.as_ref().map(Bound::exclusive),
                    None,
                    Order::Ascending,
                )
                .take(limit)
                .map(|item| item.map(|(_, deposit)| deposit))
                .collect::<StdResult<_>>()?;
            to_json_binary(&DepositsResponse { deposits })
        }
        QueryMsg::TallyResult { proposal_id } => {
            let proposal = query_load_proposal(deps, proposal_id)?;
            let tally = match proposal.status {
                ProposalStatus::DepositPeriod => TallyResult::default(),
                ProposalStatus::VotingPeriod => {
                    let params = PARAMS.load(deps.storage)?;
                    tally(deps.storage, gov.staking.as_ref(), &params, &proposal)
                        .map_err(|err| StdError::generic_err(err.to_string()))?
                        .tally
                }
                _ => proposal.final_tally,
            };
            to_json_binary(&TallyResultResponse { tally })
        }
    }
}

fn query_load_proposal(deps: Deps, proposal_id: u64) -> StdResult<Proposal> {
    load_proposal(deps.storage, proposal_id).map_err(|err| match err {
        ContractError::Std(inner) => inner,
        other => StdError::generic_err(other.to_string()),
    })
}

fn query_proposals(
    deps: Deps,
    status: Option<ProposalStatus>,
    voter: Option<String>,
    depositor: Option<String>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let voter = voter.map(|v| deps.api.addr_validate(&v)).transpose()?;
    let depositor = depositor.map(|d| deps.api.addr_validate(&d)).transpose()?;

    let mut proposals = vec![];
    for item in PROPOSALS.range(
        deps.storage,
        start_after.map(Bound::exclusive),
        None,
        Order::Ascending,
    ) {
        let (id, proposal) = item?;
        if status.as_ref().is_some_and(|s| *s != proposal.status) {
            continue;
        }
        if let Some(voter) = &voter {
            if !VOTES.has(deps.storage, (id, voter)) {
                continue;
            }
        }
        if let Some(depositor) = &depositor {
            if !DEPOSITS.has(deps.storage, (id, depositor)) {
                continue;
            }
        }
        proposals.push(proposal);
        if proposals.len() >= limit {
            break;
        }
    }
    to_json_binary(&ProposalsResponse { proposals })
}
