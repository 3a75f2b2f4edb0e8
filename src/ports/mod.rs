// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the resolver and its collaborators: parsing unit files, loading and caching
//! units, and watching the configuration tree for changes. They are implemented by
//! adapters in the adapters layer.

pub mod loader;
pub mod parser;
pub mod watcher;

// Re-export commonly used types
pub use loader::UnitLoader;
pub use parser::UnitParser;
pub use watcher::{ChangeCallback, ConfigWatcher};
