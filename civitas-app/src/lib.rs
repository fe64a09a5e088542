//! Block driver for the civitas modules.
//!
//! [`App`] owns the store and a [`civitas_core::Router`] holding bank,
//! staking, gov and authz, and runs the usual begin / deliver / end cycle
//! against them.

pub mod app;
pub mod config;
pub mod error;

pub use app::{App, BlockEvents, DeliverResult};
pub use config::{AppConfig, Genesis};
pub use error::AppError;
