pub mod authorization;
pub mod contract;
pub mod error;
pub mod keeper;
pub mod module;
pub mod msg;
pub mod state;

pub use authorization::SendAuthorization;
pub use keeper::BaseKeeper;
pub use module::BankModule;
