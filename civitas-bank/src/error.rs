use civitas_core::CoreError;
use cosmwasm_std::StdError;
use thiserror::Error;

pub const CODESPACE: &str = "bank";

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("unauthorized: only {role} can perform this action")]
    Unauthorized { role: String },

    #[error("send amount must not be empty")]
    EmptyAmount,

    #[error("duplicate send-enabled entry for {denom}")]
    DuplicateDenom { denom: String },
}

impl ContractError {
    pub fn code(&self) -> u32 {
        match self {
            ContractError::Std(_) | ContractError::Core(_) => 1,
            ContractError::Unauthorized { .. } => 4,
            ContractError::EmptyAmount => 2,
            ContractError::DuplicateDenom { .. } => 3,
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
