// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the error types that can occur while classifying configuration
//! paths, loading units and flattening definitions. All errors use `thiserror` for proper
//! error handling and conversion.

use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// Every failure is deterministic given the state of the configuration tree, so none of
/// them are retried internally. The enum is marked as `#[non_exhaustive]` to allow for
/// future additions without breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use figtree::domain::errors::ConfigError;
///
/// fn find_definition() -> Result<(), ConfigError> {
///     Err(ConfigError::DefinitionNotFound {
///         path: "models/train/Trainer".to_string(),
///         segment: "Trainer".to_string(),
///     })
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration path is empty or malformed.
    #[error("Invalid configuration path '{path}': {reason}")]
    InvalidPath {
        /// The offending path as given by the caller
        path: String,
        /// Why the path was rejected
        reason: String,
    },

    /// No prefix of the path names a directory below the root.
    #[error("Could not find '{path}': no directory prefix exists below the root")]
    DirectoryNotFound {
        /// The path being resolved
        path: String,
    },

    /// The segment after the directory prefix does not name a unit file.
    #[error("Could not find '{path}': expected unit '{unit}'")]
    UnitNotFound {
        /// The path being resolved
        path: String,
        /// The dotted unit name that was expected
        unit: String,
    },

    /// A unit file exists but could not be read, parsed or linked.
    #[error("Failed to load unit '{unit}': {message}")]
    UnitLoadError {
        /// The dotted unit name
        unit: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A definition chain segment matched neither a group name nor a storage name.
    #[error("Could not find '{path}': expected definition '{segment}'")]
    DefinitionNotFound {
        /// The path being resolved
        path: String,
        /// The unresolved chain segment
        segment: String,
    },

    /// Two sibling fields resolved to the same effective name.
    #[error("Group name '{name}' is claimed by both '{first}' and '{second}'")]
    GroupNameCollision {
        /// The effective name both fields map to
        name: String,
        /// Storage name of the field that claimed it first
        first: String,
        /// Storage name of the field that claimed it second
        second: String,
    },

    /// The requested key is not present in the configuration store.
    #[error("Configuration key not found: {key}")]
    ConfigKeyNotFound {
        /// The key that was not found
        key: String,
    },

    /// Failed to convert a configuration value to the requested type.
    #[error(
        "Failed to convert configuration value for key '{key}' to type {target_type}: {source}"
    )]
    TypeConversionError {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse a unit document.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred in a configuration watcher.
    #[error("Configuration watcher error: {message}")]
    WatcherError {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a TypeConversionError from a ParseIntError.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "integer".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseFloatError.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "float".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseBoolError.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "boolean".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError for a value of the wrong shape.
    pub fn type_mismatch(key: &str, target_type: &str, found: &str) -> Self {
        ConfigError::TypeConversionError {
            key: key.to_string(),
            target_type: target_type.to_string(),
            source: format!("found {}", found).into(),
        }
    }

    /// Wraps any error raised while loading a unit into an `UnitLoadError`.
    pub fn unit_load(unit: &str, message: impl Into<String>, source: Option<ConfigError>) -> Self {
        ConfigError::UnitLoadError {
            unit: unit.to_string(),
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
