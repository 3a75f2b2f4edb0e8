// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watcher implementations for unit change detection.
//!
//! This module contains implementations of the `ConfigWatcher` trait for
//! monitoring the configuration tree.

#[cfg(feature = "reload")]
pub mod unit_watcher;

#[cfg(feature = "reload")]
pub use unit_watcher::UnitWatcher;
