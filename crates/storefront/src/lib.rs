//! Bob's Corn purchase client library.
//!
//! Everything the `bobs-corn` binary does lives here so it can be tested
//! and reused by `corn-cli` and the integration tests.
//!
//! # Modules
//!
//! - [`db`] - durable client identity over a file-backed key-value store
//! - [`purchase`] - HTTP purchase client and outcome classification
//! - [`services`] - cooldown timer and the purchase controller state machine
//! - [`view`] - terminal rendering of controller snapshots and notices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod purchase;
pub mod services;
pub mod telemetry;
pub mod view;
