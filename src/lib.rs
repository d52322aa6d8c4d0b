//! TaskFlow library
//!
//! Record store, session/auth gate, task query engine, mutation log and
//! metrics aggregator behind the `taskflow` binary.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
pub mod workspace;
