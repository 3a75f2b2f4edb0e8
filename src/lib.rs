// SPDX-License-Identifier: MIT OR Apache-2.0

//! A hexagonal architecture configuration path resolver.
//!
//! This crate resolves path-like keys such as `configs/models/train.Trainer` into
//! nested configuration mappings. A key walks three strata: directories below a root,
//! unit files inside those directories, and nested definitions inside a unit.
//! Definitions can extend a parent, so resolving one flattens its whole inheritance
//! chain into a single ordered mapping.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types and algorithms (`ConfigPath`, `ConfigValue`, units,
//!   the path classifier and the hierarchy flattener)
//! - **Ports**: Trait definitions that define interfaces (`UnitParser`, `UnitLoader`,
//!   `ConfigWatcher`)
//! - **Adapters**: The YAML unit format, the filesystem loader and the unit watcher
//! - **Service**: The cumulative `ConfigStore` that orchestrates everything
//!
//! # Features
//!
//! - **Path Classification**: Splits a key into directory, unit and definition chain
//! - **Inheritance**: Definitions extend local or cross-unit parents
//! - **Grouping**: Fields and definitions can be exposed under a different name
//! - **Caching**: Units are cached until a resolve asks for a reload
//! - **Change Watching**: Report changed units so applications can reload them
//!
//! # Feature Flags
//!
//! - `yaml`: Enable the YAML unit format (default)
//! - `reload`: Enable unit change watching
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use figtree::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut store = ConfigStore::new(EngineSettings::new("."))?;
//!
//! // Resolve a definition and its ancestors
//! store.resolve("configs/models/train.Trainer", true)?;
//! let trainer = store.get("configs.models.train.Trainer")?;
//! let lr: f64 = trainer.lookup("lr").map(|v| v.as_f64("lr")).transpose()?.unwrap_or(0.01);
//!
//! // Resolve a whole directory tree
//! store.resolve("configs", false)?;
//! println!("lr = {}, tree = {}", lr, store.get("configs")?);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, ConfigMap, ConfigPath, ConfigResolver, ConfigValue, EngineSettings,
        GroupCollisionPolicy, Result,
    };
    pub use crate::ports::{ConfigWatcher, UnitLoader, UnitParser};
    pub use crate::service::{ConfigStore, ConfigStoreBuilder};

    pub use crate::adapters::{FileUnitLoader, SharedUnitLoader};
    // Re-export adapters based on feature flags
    #[cfg(feature = "reload")]
    pub use crate::adapters::UnitWatcher;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlUnitParser;
}
