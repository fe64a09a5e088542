//! Shared plumbing for the civitas modules.
//!
//! Everything here is deterministic and single-threaded: state lives in a
//! [`cosmwasm_std::Storage`], time comes from the block environment and all
//! iteration runs over ordered key ranges.

pub mod accounts;
pub mod authz;
pub mod coins;
pub mod error;
pub mod keepers;
pub mod keys;
pub mod math;
pub mod msg;
pub mod queue;
pub mod router;
pub mod store;
pub mod versions;

pub use error::CoreError;
pub use msg::{AnyMsg, TypeUrl, TypedMsg};
pub use router::{Module, Router};
