use std::collections::BTreeSet;

use civitas_core::coins::coins_to_string;
use cosmwasm_std::{Coin, Decimal, Event, StdResult, Storage, Timestamp, Uint64};

use crate::error::ContractError;
use crate::state::{Proposal, ProposalStatus, WeightedVoteOption, PROPOSALS};

pub fn load_proposal(store: &dyn Storage, id: u64) -> Result<Proposal, ContractError> {
    PROPOSALS
        .may_load(store, id)?
        .ok_or(ContractError::ProposalNotFound { id })
}

/// `start` plus `secs`, failing instead of wrapping past the end of time.
pub fn period_end(start: Timestamp, secs: u64) -> StdResult<Timestamp> {
    let span = Uint64::new(secs).checked_mul(Uint64::new(1_000_000_000))?;
    let end = Uint64::new(start.nanos()).checked_add(span)?;
    Ok(Timestamp::from_nanos(end.u64()))
}

fn invalid_vote(reason: impl Into<String>) -> ContractError {
    ContractError::InvalidVote {
        reason: reason.into(),
    }
}

/// Weights must be in `(0, 1]`, options distinct, and the total exactly 1.
pub fn validate_vote_options(options: &[WeightedVoteOption]) -> Result<(), ContractError> {
    if options.is_empty() {
        return Err(invalid_vote("no vote options"));
    }
    let mut seen = BTreeSet::new();
    let mut total = Decimal::zero();
    for opt in options {
        if !seen.insert(opt.option) {
            return Err(invalid_vote(format!("duplicate option {}", opt.option.as_str())));
        }
        if opt.weight.is_zero() || opt.weight > Decimal::one() {
            return Err(invalid_vote(format!(
                "weight {} of {} is outside (0, 1]",
                opt.weight,
                opt.option.as_str()
            )));
        }
        total = total
            .checked_add(opt.weight)
            .map_err(|_| invalid_vote("weights overflow"))?;
    }
    if total != Decimal::one() {
        return Err(invalid_vote(format!("weights sum to {total}, not 1")));
    }
    Ok(())
}

/// `"yes:0.6,no:0.4"`
pub fn options_to_string(options: &[WeightedVoteOption]) -> String {
    options
        .iter()
        .map(|o| format!("{}:{}", o.option.as_str(), o.weight))
        .collect::<Vec<_>>()
        .join(",")
}

// ─── Events ───────────────────────────────────────────────────────────

pub fn status_changed_event(id: u64, old: &ProposalStatus, new: &ProposalStatus) -> Event {
    Event::new("proposal_status_changed")
        .add_attribute("proposal_id", id.to_string())
        .add_attribute("old", old.as_str())
        .add_attribute("new", new.as_str())
}

pub fn deposit_event(id: u64, depositor: &str, amount: &[Coin]) -> Event {
    Event::new("proposal_deposit")
        .add_attribute("proposal_id", id.to_string())
        .add_attribute("depositor", depositor)
        .add_attribute("amount", coins_to_string(amount))
}

pub fn executed_event(id: u64, success: bool) -> Event {
    Event::new("proposal_executed")
        .add_attribute("proposal_id", id.to_string())
        .add_attribute("result", if success { "success" } else { "failed" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VoteOption;

    fn opt(option: VoteOption, pct: u64) -> WeightedVoteOption {
        WeightedVoteOption {
            option,
            weight: Decimal::percent(pct),
        }
    }

    #[test]
    fn accepts_split_votes_summing_to_one() {
        let options = vec![opt(VoteOption::Yes, 60), opt(VoteOption::No, 40)];
        validate_vote_options(&options).unwrap();
        assert_eq!(options_to_string(&options), "yes:0.6,no:0.4");
    }

    #[test]
    fn rejects_bad_weights() {
        assert!(validate_vote_options(&[]).is_err());
        assert!(validate_vote_options(&[opt(VoteOption::Yes, 90)]).is_err());
        assert!(validate_vote_options(&[opt(VoteOption::Yes, 100), opt(VoteOption::No, 0)]).is_err());
        assert!(validate_vote_options(&[opt(VoteOption::Yes, 50), opt(VoteOption::Yes, 50)]).is_err());
        assert!(validate_vote_options(&[opt(VoteOption::Yes, 150)]).is_err());
    }

    #[test]
    fn period_end_adds_seconds_or_reports_overflow() {
        let start = Timestamp::from_seconds(1_000);
        assert_eq!(period_end(start, 200).unwrap(), Timestamp::from_seconds(1_200));

        assert!(period_end(start, u64::MAX / 1_000_000_000 + 1).is_err());
        assert!(period_end(Timestamp::from_nanos(u64::MAX - 10), 1).is_err());
    }
}
