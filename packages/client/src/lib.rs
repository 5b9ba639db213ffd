//! Command-line client for the Beehive chat relay.

pub mod auth;
pub mod domain;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
