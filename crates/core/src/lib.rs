//! Bob's Corn Core - Shared types library.
//!
//! This crate provides common types used across all Bob's Corn components:
//! - `storefront` - Purchase client library and interactive binary
//! - `cli` - One-shot command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no timers. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Client identity, purchase outcomes, and cooldown state
//! - [`store`] - Key-value persistence trait with an in-memory implementation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod store;
pub mod types;

pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use types::*;
