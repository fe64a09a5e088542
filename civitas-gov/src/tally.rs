//! Stake-weighted vote counting.
//!
//! Validators vote with the stake delegated to them. A delegator who casts
//! their own vote takes their shares out of the validator's vote and counts
//! them under their own options instead.

use std::collections::BTreeMap;

use civitas_core::keepers::StakingKeeper;
use civitas_core::math::{checked_div, dec_from_uint, dec_to_uint_floor, mul_div};
use cosmwasm_std::{Addr, Decimal256, Order, StdError, StdResult, Storage};

use crate::error::ContractError;
use crate::params::Params;
use crate::state::{Proposal, TallyResult, VoteOption, WeightedVoteOption, VOTES};

#[derive(Debug, Clone, PartialEq)]
pub struct TallyOutcome {
    pub passes: bool,
    /// Deposits are burned instead of refunded (veto, or quorum failure with
    /// `burn_vote_quorum`).
    pub burn_deposits: bool,
    pub tally: TallyResult,
}

struct ValidatorSnapshot {
    tokens: Decimal256,
    delegator_shares: Decimal256,
    deductions: Decimal256,
    vote: Option<Vec<WeightedVoteOption>>,
}

#[derive(Default)]
struct Accumulator {
    counts: BTreeMap<VoteOption, Decimal256>,
}

impl Accumulator {
    fn add(&mut self, options: &[WeightedVoteOption], power: Decimal256) -> StdResult<()> {
        for opt in options {
            let share = power.checked_mul(Decimal256::from(opt.weight))?;
            let count = self.counts.entry(opt.option).or_default();
            *count = count.checked_add(share)?;
        }
        Ok(())
    }

    fn get(&self, option: VoteOption) -> Decimal256 {
        self.counts.get(&option).copied().unwrap_or_default()
    }

    fn total(&self) -> StdResult<Decimal256> {
        self.counts
            .values()
            .try_fold(Decimal256::zero(), |acc, v| acc.checked_add(*v).map_err(StdError::from))
    }

    fn result(&self) -> StdResult<TallyResult> {
        Ok(TallyResult {
            yes_count: dec_to_uint_floor(self.get(VoteOption::Yes))?,
            abstain_count: dec_to_uint_floor(self.get(VoteOption::Abstain))?,
            no_count: dec_to_uint_floor(self.get(VoteOption::No))?,
            no_with_veto_count: dec_to_uint_floor(self.get(VoteOption::NoWithVeto))?,
        })
    }
}

/// Counts the votes of `proposal` against the current bonded set. Read-only.
pub fn tally(
    store: &dyn Storage,
    staking: &dyn StakingKeeper,
    params: &Params,
    proposal: &Proposal,
) -> Result<TallyOutcome, ContractError> {
    let mut validators: BTreeMap<Addr, ValidatorSnapshot> = BTreeMap::new();
    staking.iterate_bonded_validators(store, &mut |val| {
        validators.insert(
            val.operator,
            ValidatorSnapshot {
                tokens: dec_from_uint(val.tokens),
                delegator_shares: val.delegator_shares,
                deductions: Decimal256::zero(),
                vote: None,
            },
        );
        Ok(false)
    })?;

    let mut acc = Accumulator::default();
    for item in VOTES
        .prefix(proposal.id)
        .range(store, None, None, Order::Ascending)
    {
        let (voter, vote) = item?;
        if let Some(val) = validators.get_mut(&voter) {
            val.vote = Some(vote.options.clone());
        }

        staking.iterate_delegations(store, &voter, &mut |del| {
            let Some(val) = validators.get_mut(&del.validator) else {
                return Ok(false);
            };
            if val.delegator_shares.is_zero() {
                return Ok(false);
            }
            val.deductions = val.deductions.checked_add(del.shares)?;
            let power = mul_div(del.shares, val.tokens, val.delegator_shares)?;
            acc.add(&vote.options, power)?;
            Ok(false)
        })?;
    }

    for val in validators.values() {
        let Some(options) = &val.vote else {
            continue;
        };
        if val.delegator_shares.is_zero() {
            continue;
        }
        let remaining = val
            .delegator_shares
            .checked_sub(val.deductions)
            .map_err(StdError::from)?;
        let power = mul_div(remaining, val.tokens, val.delegator_shares)?;
        acc.add(options, power)?;
    }

    let tally = acc.result()?;
    let rejected = |burn_deposits: bool| TallyOutcome {
        passes: false,
        burn_deposits,
        tally: tally.clone(),
    };

    let total_bonded = staking.total_bonded_tokens(store)?;
    if total_bonded.is_zero() {
        return Ok(rejected(false));
    }

    let participation = acc.total()?;
    let quorum = dec_from_uint(total_bonded)
        .checked_mul(Decimal256::from(params.quorum))
        .map_err(StdError::from)?;
    if participation < quorum {
        return Ok(rejected(params.burn_vote_quorum));
    }

    let non_abstain = participation
        .checked_sub(acc.get(VoteOption::Abstain))
        .map_err(StdError::from)?;
    if non_abstain.is_zero() {
        return Ok(rejected(false));
    }

    let veto = checked_div(acc.get(VoteOption::NoWithVeto), participation)?;
    if veto > Decimal256::from(params.veto_threshold) {
        return Ok(rejected(params.burn_vote_veto));
    }

    let yes = checked_div(acc.get(VoteOption::Yes), non_abstain)?;
    if yes >= Decimal256::from(params.threshold_for(proposal.expedited)) {
        return Ok(TallyOutcome {
            passes: true,
            burn_deposits: false,
            tally: tally.clone(),
        });
    }
    Ok(rejected(false))
}
