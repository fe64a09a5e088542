pub mod contract;
pub mod error;
pub mod helpers;
pub mod module;
pub mod msg;
pub mod params;
pub mod state;
pub mod tally;

pub use module::{GovConfig, GovModule};
