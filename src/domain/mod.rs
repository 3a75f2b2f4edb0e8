// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core business logic and types.
//!
//! This module contains the configuration path and value types, the unit model, and the
//! classification and flattening algorithms. It is independent of any file format.

pub mod classifier;
pub mod config_path;
pub mod config_value;
pub mod document;
pub mod errors;
pub mod flatten;
pub mod service;
pub mod settings;
pub mod unit;

// Re-export commonly used types
pub use classifier::{Classification, PathClassifier, UnitLocator};
pub use config_path::ConfigPath;
pub use config_value::{ConfigMap, ConfigValue};
pub use errors::{ConfigError, Result};
pub use flatten::{GroupCollisionPolicy, HierarchyFlattener};
pub use service::ConfigResolver;
pub use settings::EngineSettings;
pub use unit::{Definition, Field, FieldValue, Unit};
