//! Core domain + application logic for the MessageBroadcaster relay.
//!
//! This crate is framework-agnostic. Telegram and PostgreSQL live behind
//! ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod reconcile;
pub mod registry;
pub mod relay;
pub mod security;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
