// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit loader trait definition.
//!
//! This module defines the `UnitLoader` trait: a get-or-load cache of unit snapshots
//! keyed by dotted unit name.

use crate::domain::{Result, Unit};
use std::sync::Arc;

/// A trait for loading units by name.
///
/// Implementations own a cache of unit snapshots. `load` with `reload == false`
/// returns the cached snapshot when one exists, even if the file changed since; with
/// `reload == true` the unit is always read again and the cache entry replaced.
///
/// # Examples
///
/// ```rust
/// use figtree::domain::unit::Fields;
/// use figtree::domain::{ConfigError, Result, Unit};
/// use figtree::ports::UnitLoader;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct MemoryLoader(HashMap<String, Arc<Unit>>);
///
/// impl UnitLoader for MemoryLoader {
///     fn load(&mut self, unit: &str, _reload: bool) -> Result<Arc<Unit>> {
///         self.0.get(unit).cloned().ok_or_else(|| ConfigError::UnitNotFound {
///             path: unit.replace('.', "/"),
///             unit: unit.to_string(),
///         })
///     }
///     fn is_cached(&self, unit: &str) -> bool { self.0.contains_key(unit) }
///     fn invalidate(&mut self, _unit: &str) -> bool { false }
///     fn clear(&mut self) {}
///     fn extensions(&self) -> Vec<String> { vec!["mem".to_string()] }
/// }
///
/// let mut loader = MemoryLoader::default();
/// loader.0.insert("a".into(), Arc::new(Unit::new("a", "a.mem", Fields::new())));
/// assert!(loader.load("a", false).is_ok());
/// assert!(loader.load("b", false).is_err());
/// ```
pub trait UnitLoader: Send {
    /// Returns the unit named `unit` (dotted, e.g. `models.train`).
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<Unit>)` - The cached or freshly loaded snapshot
    /// * `Err(ConfigError::UnitNotFound)` - No file exists for the name
    /// * `Err(ConfigError::UnitLoadError)` - The file could not be read or linked
    fn load(&mut self, unit: &str, reload: bool) -> Result<Arc<Unit>>;

    /// Checks whether a snapshot of `unit` is cached.
    fn is_cached(&self, unit: &str) -> bool;

    /// Drops the cached snapshot of `unit`. Returns `true` if one was cached.
    fn invalidate(&mut self, unit: &str) -> bool;

    /// Drops every cached snapshot.
    fn clear(&mut self);

    /// Returns the unit file extensions this loader reads.
    fn extensions(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn UnitLoader>>();
    }
}
