use civitas_core::coins::validate_coins;
use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl, TypedMsg};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Api, Coin};

use crate::error::ContractError;
use crate::helpers::validate_vote_options;
use crate::params::Params;
use crate::state::{
    Deposit, Proposal, ProposalStatus, TallyResult, Vote, VoteOption, WeightedVoteOption,
};

#[cw_serde]
pub struct InstantiateMsg {
    pub params: Params,
    /// First id handed out; defaults to 1.
    pub starting_proposal_id: Option<u64>,
}

impl Default for InstantiateMsg {
    fn default() -> Self {
        Self {
            params: Params::default(),
            starting_proposal_id: None,
        }
    }
}

#[cw_serde]
pub struct MsgSubmitProposal {
    /// Executed in order, atomically, once the proposal passes. May be empty.
    pub messages: Vec<AnyMsg>,
    pub initial_deposit: Vec<Coin>,
    pub proposer: String,
    pub metadata: String,
    pub title: String,
    pub summary: String,
    pub expedited: bool,
}

impl TypeUrl for MsgSubmitProposal {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgSubmitProposal";
}

impl TypedMsg for MsgSubmitProposal {
    fn signers(&self) -> Vec<String> {
        vec![self.proposer.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.proposer)?;
        validate_coins(&self.initial_deposit)?;
        for (i, msg) in self.messages.iter().enumerate() {
            if msg.type_url.is_empty() {
                return Err(ContractError::InvalidMessage {
                    reason: format!("message {i} has an empty type url"),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cw_serde]
pub struct MsgDeposit {
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
}

impl TypeUrl for MsgDeposit {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgDeposit";
}

impl TypedMsg for MsgDeposit {
    fn signers(&self) -> Vec<String> {
        vec![self.depositor.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.depositor)?;
        if self.amount.is_empty() {
            return Err(ContractError::InvalidDeposit {
                reason: "deposit amount must not be empty".to_string(),
            }
            .into());
        }
        validate_coins(&self.amount)
    }
}

#[cw_serde]
pub struct MsgVote {
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
    pub metadata: String,
}

impl TypeUrl for MsgVote {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgVote";
}

impl TypedMsg for MsgVote {
    fn signers(&self) -> Vec<String> {
        vec![self.voter.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.voter)?;
        Ok(())
    }
}

#[cw_serde]
pub struct MsgVoteWeighted {
    pub proposal_id: u64,
    pub voter: String,
    pub options: Vec<WeightedVoteOption>,
    pub metadata: String,
}

impl TypeUrl for MsgVoteWeighted {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgVoteWeighted";
}

impl TypedMsg for MsgVoteWeighted {
    fn signers(&self) -> Vec<String> {
        vec![self.voter.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.voter)?;
        validate_vote_options(&self.options)?;
        Ok(())
    }
}

#[cw_serde]
pub struct MsgCancelProposal {
    pub proposal_id: u64,
    pub proposer: String,
}

impl TypeUrl for MsgCancelProposal {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgCancelProposal";
}

impl TypedMsg for MsgCancelProposal {
    fn signers(&self) -> Vec<String> {
        vec![self.proposer.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.proposer)?;
        Ok(())
    }
}

/// Replaces the full parameter set. Only the governance authority may send it,
/// which in practice means a passed proposal.
#[cw_serde]
pub struct MsgUpdateParams {
    pub authority: String,
    pub params: Params,
}

impl TypeUrl for MsgUpdateParams {
    const TYPE_URL: &'static str = "/cosmos.gov.v1.MsgUpdateParams";
}

impl TypedMsg for MsgUpdateParams {
    fn signers(&self) -> Vec<String> {
        vec![self.authority.clone()]
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        validate_addr(api, &self.authority)?;
        self.params.validate(api)?;
        Ok(())
    }
}

pub enum ExecuteMsg {
    SubmitProposal(MsgSubmitProposal),
    Deposit(MsgDeposit),
    Vote(MsgVote),
    VoteWeighted(MsgVoteWeighted),
    CancelProposal(MsgCancelProposal),
    UpdateParams(MsgUpdateParams),
}

impl ExecuteMsg {
    pub const TYPE_URLS: [&'static str; 6] = [
        MsgSubmitProposal::TYPE_URL,
        MsgDeposit::TYPE_URL,
        MsgVote::TYPE_URL,
        MsgVoteWeighted::TYPE_URL,
        MsgCancelProposal::TYPE_URL,
        MsgUpdateParams::TYPE_URL,
    ];

    pub fn from_any(msg: &AnyMsg) -> Result<Self, CoreError> {
        match msg.type_url.as_str() {
            t if t == MsgSubmitProposal::TYPE_URL => {
                Ok(ExecuteMsg::SubmitProposal(MsgSubmitProposal::from_any(msg)?))
            }
            t if t == MsgDeposit::TYPE_URL => Ok(ExecuteMsg::Deposit(MsgDeposit::from_any(msg)?)),
            t if t == MsgVote::TYPE_URL => Ok(ExecuteMsg::Vote(MsgVote::from_any(msg)?)),
            t if t == MsgVoteWeighted::TYPE_URL => {
                Ok(ExecuteMsg::VoteWeighted(MsgVoteWeighted::from_any(msg)?))
            }
            t if t == MsgCancelProposal::TYPE_URL => {
                Ok(ExecuteMsg::CancelProposal(MsgCancelProposal::from_any(msg)?))
            }
            t if t == MsgUpdateParams::TYPE_URL => {
                Ok(ExecuteMsg::UpdateParams(MsgUpdateParams::from_any(msg)?))
            }
            other => Err(CoreError::UnregisteredMsg {
                type_url: other.to_string(),
            }),
        }
    }

    pub fn signers(&self) -> Vec<String> {
        match self {
            ExecuteMsg::SubmitProposal(msg) => msg.signers(),
            ExecuteMsg::Deposit(msg) => msg.signers(),
            ExecuteMsg::Vote(msg) => msg.signers(),
            ExecuteMsg::VoteWeighted(msg) => msg.signers(),
            ExecuteMsg::CancelProposal(msg) => msg.signers(),
            ExecuteMsg::UpdateParams(msg) => msg.signers(),
        }
    }

    pub fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        match self {
            ExecuteMsg::SubmitProposal(msg) => msg.validate_basic(api),
            ExecuteMsg::Deposit(msg) => msg.validate_basic(api),
            ExecuteMsg::Vote(msg) => msg.validate_basic(api),
            ExecuteMsg::VoteWeighted(msg) => msg.validate_basic(api),
            ExecuteMsg::CancelProposal(msg) => msg.validate_basic(api),
            ExecuteMsg::UpdateParams(msg) => msg.validate_basic(api),
        }
    }
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ParamsResponse)]
    Params {},

    #[returns(ProposalResponse)]
    Proposal { proposal_id: u64 },

    /// Proposals in id order, optionally filtered by status, by a voter who
    /// has a recorded vote, or by a depositor with a recorded deposit.
    #[returns(ProposalsResponse)]
    Proposals {
        status: Option<ProposalStatus>,
        voter: Option<String>,
        depositor: Option<String>,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(VoteResponse)]
    Vote { proposal_id: u64, voter: String },

    #[returns(VotesResponse)]
    Votes {
        proposal_id: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(DepositResponse)]
    Deposit { proposal_id: u64, depositor: String },

    #[returns(DepositsResponse)]
    Deposits {
        proposal_id: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },

    /// Zero during the deposit period, live during voting, final afterwards.
    #[returns(TallyResultResponse)]
    TallyResult { proposal_id: u64 },
}

#[cw_serde]
pub struct ParamsResponse {
    pub params: Params,
}

#[cw_serde]
pub struct ProposalResponse {
    pub proposal: Proposal,
}

#[cw_serde]
pub struct ProposalsResponse {
    pub proposals: Vec<Proposal>,
}

#[cw_serde]
pub struct VoteResponse {
    pub vote: Vote,
}

#[cw_serde]
pub struct VotesResponse {
    pub votes: Vec<Vote>,
}

#[cw_serde]
pub struct DepositResponse {
    pub deposit: Deposit,
}

#[cw_serde]
pub struct DepositsResponse {
    pub deposits: Vec<Deposit>,
}

#[cw_serde]
pub struct TallyResultResponse {
    pub tally: TallyResult,
}

/// `data` of a successful `MsgSubmitProposal`.
#[cw_serde]
pub struct SubmitProposalResponse {
    pub proposal_id: u64,
}
