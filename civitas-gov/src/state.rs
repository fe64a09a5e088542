use std::fmt;

use civitas_core::queue::TimeQueue;
use civitas_core::AnyMsg;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::params::Params;

#[cw_serde]
pub enum ProposalStatus {
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    Failed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Passed | ProposalStatus::Rejected | ProposalStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::DepositPeriod => "deposit_period",
            ProposalStatus::VotingPeriod => "voting_period",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cw_serde]
#[derive(Default)]
pub struct TallyResult {
    pub yes_count: Uint128,
    pub abstain_count: Uint128,
    pub no_count: Uint128,
    pub no_with_veto_count: Uint128,
}

#[cw_serde]
pub struct Proposal {
    pub id: u64,
    pub messages: Vec<AnyMsg>,
    pub status: ProposalStatus,
    /// Zero until the proposal reaches a terminal status.
    pub final_tally: TallyResult,
    pub submit_time: Timestamp,
    pub deposit_end_time: Timestamp,
    pub total_deposit: Vec<Coin>,
    pub voting_start_time: Option<Timestamp>,
    pub voting_end_time: Option<Timestamp>,
    pub metadata: String,
    pub title: String,
    pub summary: String,
    pub proposer: Addr,
    pub expedited: bool,
    pub failed_reason: String,
}

#[cw_serde]
pub struct Deposit {
    pub proposal_id: u64,
    pub depositor: Addr,
    pub amount: Vec<Coin>,
}

#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord)]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteOption::Yes => "yes",
            VoteOption::Abstain => "abstain",
            VoteOption::No => "no",
            VoteOption::NoWithVeto => "no_with_veto",
        }
    }
}

#[cw_serde]
pub struct WeightedVoteOption {
    pub option: VoteOption,
    pub weight: Decimal,
}

#[cw_serde]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Addr,
    pub options: Vec<WeightedVoteOption>,
    pub metadata: String,
}

/// Next proposal id to allocate.
pub const PROPOSAL_ID: Item<u64> = Item::new("\u{0}");
pub const PROPOSALS: Map<u64, Proposal> = Map::new("\u{1}");
pub const DEPOSITS: Map<(u64, &Addr), Deposit> = Map::new("\u{2}");
pub const VOTES: Map<(u64, &Addr), Vote> = Map::new("\u{3}");
/// Proposals in `DepositPeriod`, keyed by `deposit_end_time`.
pub const INACTIVE_QUEUE: TimeQueue<u64> = TimeQueue::new("\u{4}");
/// Proposals in `VotingPeriod`, keyed by `voting_end_time`.
pub const ACTIVE_QUEUE: TimeQueue<u64> = TimeQueue::new("\u{5}");
pub const PARAMS: Item<Params> = Item::new("\u{6}");
