// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing port implementations.
//!
//! This module contains concrete implementations of the traits defined in the ports
//! layer: the YAML unit parser, the filesystem unit loader and the unit watcher.

pub mod file_loader;
#[cfg(feature = "yaml")]
pub mod yaml_unit;

pub mod watchers;

pub use file_loader::{FileUnitLoader, SharedUnitLoader};
#[cfg(feature = "reload")]
pub use watchers::UnitWatcher;
#[cfg(feature = "yaml")]
pub use yaml_unit::YamlUnitParser;
