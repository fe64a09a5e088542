use civitas_core::CoreError;
use cosmwasm_std::StdError;
use thiserror::Error;

pub const CODESPACE: &str = "gov";

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("proposal {id} doesn't exist")]
    ProposalNotFound { id: u64 },

    #[error("inactive proposal {id}")]
    InactiveProposal { id: u64 },

    #[error("invalid proposal message: {reason}")]
    InvalidMessage { reason: String },

    #[error("invalid vote: {reason}")]
    InvalidVote { reason: String },

    #[error("invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    #[error("invalid deposit: {reason}")]
    InvalidDeposit { reason: String },

    #[error("invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("initial deposit too small: {got} is smaller than {required}")]
    InsufficientInitialDeposit { required: String, got: String },

    #[error("unauthorized: expected {expected}, got {got}")]
    Unauthorized { expected: String, got: String },

    #[error("metadata too long: limit is {max} bytes")]
    MetadataTooLong { max: u64 },

    #[error("cancel period of proposal {id} has ended")]
    CancelPeriodEnded { id: u64 },

    #[error("deposit of {depositor} on proposal {id} doesn't exist")]
    DepositNotFound { id: u64, depositor: String },

    #[error("vote of {voter} on proposal {id} doesn't exist")]
    VoteNotFound { id: u64, voter: String },

    #[error("execution of proposal {id} failed: {reason}")]
    ProposalExecutionFailed { id: u64, reason: String },

    #[error("store corrupted: {reason}")]
    Corrupted { reason: String },
}

impl ContractError {
    /// Stable code within the `gov` codespace.
    pub fn code(&self) -> u32 {
        match self {
            ContractError::Std(_) | ContractError::Core(_) => 1,
            ContractError::ProposalNotFound { .. } => 2,
            ContractError::InactiveProposal { .. } => 3,
            ContractError::InvalidVote { .. } => 7,
            ContractError::InvalidParams { .. } => 8,
            ContractError::InvalidMessage { .. } => 12,
            ContractError::Unauthorized { .. } => 13,
            ContractError::MetadataTooLong { .. } => 15,
            ContractError::InsufficientInitialDeposit { .. } => 16,
            ContractError::CancelPeriodEnded { .. } => 20,
            ContractError::InvalidProposal { .. } => 21,
            ContractError::InvalidDeposit { .. } => 23,
            ContractError::DepositNotFound { .. } => 30,
            ContractError::VoteNotFound { .. } => 31,
            ContractError::InvalidAddress { .. } => 32,
            ContractError::ProposalExecutionFailed { .. } => 33,
            ContractError::Corrupted { .. } => 34,
        }
    }
}

impl From<ContractError> for CoreError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Core(inner) => inner,
            ContractError::Std(inner) => CoreError::Std(inner),
            other => CoreError::module(CODESPACE, other.code(), other.to_string()),
        }
    }
}
