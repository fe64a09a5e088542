use civitas_core::CoreError;
use cosmwasm_std::StdError;
use thiserror::Error;

pub const CODESPACE: &str = "authz";

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid expiration: {reason}")]
    InvalidExpiration { reason: String },

    #[error("invalid authorization: {reason}")]
    InvalidAuthorization { reason: String },

    #[error("no grant from {granter} to {grantee} for {msg_type_url}")]
    GrantNotFound {
        granter: String,
        grantee: String,
        msg_type_url: String,
    },

    #[error("grantee and granter must differ")]
    GranteeIsGranter,

    #[error("message {index} has {signers} signers, exactly one is supported")]
    MultiSignerNotSupported { index: usize, signers: usize },

    #[error("exec requires at least one message")]
    EmptyMsgs,

    #[error("exec carries {got} messages, at most {max} allowed")]
    TooManyMsgs { max: usize, got: usize },
}

impl ContractError {
    pub fn code(&self) -> u32 {
        match self {
            ContractError::Std(_) | ContractError::Core(_) => 1,
            ContractError::Unauthorized { .. } => 2,
            ContractError::InvalidExpiration { .. } => 3,
            ContractError::InvalidAuthorization { .. } => 4,
            ContractError::GrantNotFound { .. } => 5,
            ContractError::GranteeIsGranter => 7,
            ContractError::MultiSignerNotSupported { .. } => 9,
            ContractError::EmptyMsgs => 10,
            ContractError::TooManyMsgs { .. } => 11,
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
