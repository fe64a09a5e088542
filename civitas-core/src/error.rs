use cosmwasm_std::StdError;
use thiserror::Error;

/// Codespace used for errors raised by the shared plumbing itself.
pub const SDK_CODESPACE: &str = "sdk";

/// Error crossing the router boundary.
///
/// Module crates keep their own `ContractError` and convert into
/// [`CoreError::Module`] when a message leaves the module, so callers only
/// ever see a codespace, a stable code and a log line.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("insufficient funds: {available} is smaller than {required}")]
    InsufficientFunds { required: String, available: String },

    #[error("{denom} transfers are currently disabled")]
    SendDisabled { denom: String },

    #[error("invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("unrecognized message type: {type_url}")]
    UnregisteredMsg { type_url: String },

    #[error("message type {type_url} is already routed")]
    DuplicateRoute { type_url: String },

    #[error("expected message type {expected}, got {got}")]
    UnexpectedMsgType { expected: String, got: String },

    #[error("unknown authorization type: {type_url}")]
    UnknownAuthorization { type_url: String },

    #[error("{log}")]
    Module {
        codespace: String,
        code: u32,
        log: String,
    },
}

impl CoreError {
    pub fn codespace(&self) -> &str {
        match self {
            CoreError::Module { codespace, .. } => codespace,
            _ => SDK_CODESPACE,
        }
    }

    /// Stable numeric code within [`CoreError::codespace`].
    pub fn code(&self) -> u32 {
        match self {
            CoreError::Std(_) => 1,
            CoreError::InsufficientFunds { .. } => 5,
            CoreError::UnregisteredMsg { .. } => 6,
            CoreError::InvalidAddress { .. } => 7,
            CoreError::InvalidCoins { .. } => 10,
            CoreError::SendDisabled { .. } => 18,
            CoreError::DuplicateRoute { .. } => 18,
            CoreError::UnexpectedMsgType { .. } => 29,
            CoreError::UnknownAuthorization { .. } => 29,
            CoreError::Module { code, .. } => *code,
        }
    }

    pub fn module(codespace: &str, code: u32, log: impl Into<String>) -> Self {
        CoreError::Module {
            codespace: codespace.to_string(),
            code,
            log: log.into(),
        }
    }
}
