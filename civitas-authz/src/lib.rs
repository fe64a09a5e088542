pub mod authorization;
pub mod contract;
pub mod error;
pub mod module;
pub mod msg;
pub mod state;

pub use authorization::{CountAuthorization, GenericAuthorization};
pub use module::{AuthzConfig, AuthzModule};
