// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the configuration store.
//!
//! This module contains the concrete implementation of the `ConfigResolver` trait,
//! which provides the main interface for resolving configuration paths.

pub mod config_store;

// Re-export commonly used types
pub use config_store::{ConfigStore, ConfigStoreBuilder};
