use civitas_core::CoreError;
use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AppError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("genesis of {module} failed: {source}")]
    Genesis { module: String, source: CoreError },

    #[error("no block in progress")]
    NoBlock,

    #[error("block {height} already in progress")]
    BlockInProgress { height: u64 },

    /// Raised by an end-block hook. The chain cannot continue past it.
    #[error("end block at height {height} failed: {source}")]
    EndBlock { height: u64, source: CoreError },
}
