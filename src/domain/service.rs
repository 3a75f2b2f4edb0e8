// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration resolver trait definition.
//!
//! This module defines the `ConfigResolver` trait, the main interface for resolving
//! configuration paths into a cumulative store and reading the merged result.

use crate::domain::{ConfigError, ConfigMap, ConfigValue, Result};

/// The main configuration resolver trait.
///
/// A resolver accumulates the results of repeated [`resolve`](ConfigResolver::resolve)
/// calls. Each call replaces the top-level key it produces; keys produced by earlier
/// calls for other paths are left alone.
///
/// # Examples
///
/// ```rust
/// use figtree::domain::{ConfigMap, ConfigResolver, ConfigValue, Result};
///
/// struct FixedResolver(ConfigMap);
///
/// impl ConfigResolver for FixedResolver {
///     fn resolve(&mut self, path: &str, _reload: bool) -> Result<()> {
///         self.0.insert(path.replace('/', "."), ConfigValue::from(true));
///         Ok(())
///     }
///
///     fn resolve_default(&mut self) -> Result<()> {
///         self.resolve("configs", true)
///     }
///
///     fn as_mapping(&self) -> &ConfigMap {
///         &self.0
///     }
/// }
///
/// let mut resolver = FixedResolver(ConfigMap::new());
/// resolver.resolve("models/train", true).unwrap();
/// assert!(resolver.has("models.train"));
/// assert!(resolver.get("models.eval").is_err());
/// ```
pub trait ConfigResolver {
    /// Resolves `path` and merges the result into the store.
    ///
    /// With `reload` set, the queried unit (or every unit of a queried directory)
    /// is re-read from disk. Units reached through references still come from the
    /// cache. Without it, previously loaded snapshots are reused.
    fn resolve(&mut self, path: &str, reload: bool) -> Result<()>;

    /// Resolves the configured default path with `reload` set.
    fn resolve_default(&mut self) -> Result<()>;

    /// Returns the merged mapping.
    fn as_mapping(&self) -> &ConfigMap;

    /// Returns the value stored under a top-level key such as `models.train.Trainer`.
    fn get(&self, key: &str) -> Result<&ConfigValue> {
        self.as_mapping()
            .get(key)
            .ok_or_else(|| ConfigError::ConfigKeyNotFound {
                key: key.to_string(),
            })
    }

    /// Checks whether a top-level key is present.
    fn has(&self, key: &str) -> bool {
        self.as_mapping().contains_key(key)
    }
}
