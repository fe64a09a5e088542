pub mod authorization;
pub mod contract;
pub mod error;
pub mod keeper;
pub mod module;
pub mod msg;
pub mod state;

pub use authorization::{AuthorizationType, StakeAuthorization, Validators};
pub use keeper::Keeper;
pub use module::StakingModule;
