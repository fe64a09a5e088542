use civitas_core::CoreError;
use cosmwasm_std::StdError;
use thiserror::Error;

pub const CODESPACE: &str = "staking";

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("validator {address} does not exist")]
    ValidatorNotFound { address: String },

    #[error("validator {address} already exists")]
    ValidatorExists { address: String },

    #[error("no delegation from {delegator} to {validator}")]
    DelegationNotFound { delegator: String, validator: String },

    #[error("invalid coin denomination: got {got}, expected {expected}")]
    InvalidDenom { expected: String, got: String },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("not enough delegation shares")]
    InsufficientShares,
}

impl ContractError {
    pub fn code(&self) -> u32 {
        match self {
            ContractError::Std(_) | ContractError::Core(_) => 1,
            ContractError::ValidatorExists { .. } => 4,
            ContractError::ValidatorNotFound { .. } => 3,
            ContractError::DelegationNotFound { .. } => 19,
            ContractError::InvalidDenom { .. } => 29,
            ContractError::ZeroAmount => 2,
            ContractError::InsufficientShares => 22,
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
