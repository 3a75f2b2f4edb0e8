// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cumulative configuration store.
//!
//! This module provides [`ConfigStore`], the default implementation of
//! [`ConfigResolver`]. It classifies each query path, loads the units it touches
//! through a [`UnitLoader`], flattens them and merges the result under the query's
//! top-level key.

use crate::adapters::FileUnitLoader;
use crate::domain::{
    Classification, ConfigError, ConfigMap, ConfigPath, ConfigResolver, ConfigValue,
    EngineSettings, HierarchyFlattener, PathClassifier, Result, UnitLocator,
};
use crate::ports::{UnitLoader, UnitParser};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Default implementation of the configuration resolver.
///
/// Every [`resolve`](ConfigResolver::resolve) replaces the top-level key the query
/// produces and leaves all other keys alone.
///
/// # Examples
///
/// ```rust,no_run
/// use figtree::prelude::*;
///
/// # fn main() -> Result<()> {
/// let mut store = ConfigStore::new(EngineSettings::new("/srv/app"))?;
///
/// store.resolve("configs/models/train.Trainer", true)?;
/// let lr = store.get("configs.models.train.Trainer")?.lookup("lr");
/// println!("lr = {:?}", lr);
/// # Ok(())
/// # }
/// ```
pub struct ConfigStore {
    /// Root, default path and walk settings
    settings: EngineSettings,
    /// Loader owning the unit cache
    loader: Box<dyn UnitLoader>,
    /// Classifier for query paths
    classifier: PathClassifier,
    /// Flattener applying the configured collision policy
    flattener: HierarchyFlattener,
    /// The merged result
    values: ConfigMap,
}

impl ConfigStore {
    /// Creates a store reading YAML units below the root in `settings`.
    #[cfg(feature = "yaml")]
    pub fn new(settings: EngineSettings) -> Result<Self> {
        Self::builder().with_settings(settings).build()
    }

    /// Creates a store configured from `FIGTREE_*` environment variables.
    #[cfg(feature = "yaml")]
    pub fn from_env() -> Result<Self> {
        Self::new(EngineSettings::from_env()?)
    }

    /// Creates a new store builder.
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::new()
    }

    /// Returns the settings the store was built with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the unit loader.
    pub fn unit_loader(&self) -> &dyn UnitLoader {
        self.loader.as_ref()
    }

    /// Returns the unit loader for direct cache management.
    pub fn unit_loader_mut(&mut self) -> &mut dyn UnitLoader {
        self.loader.as_mut()
    }

    /// Drops every cached unit, so the next resolve reads all units again.
    pub fn clear_cache(&mut self) {
        self.loader.clear();
    }

    /// Consumes the store and returns the merged mapping.
    pub fn into_mapping(self) -> ConfigMap {
        self.values
    }

    /// Resolves an already parsed path.
    pub fn resolve_path(&mut self, path: &ConfigPath, reload: bool) -> Result<()> {
        let classification = self.classifier.classify(path)?;

        let unit_name = classification.unit_name();

        let (key, value) = match classification {
            Classification::Directory { dir } => {
                let tree = self.walk_directory(&dir, reload)?;
                let (first, rest) = dir.split_first().ok_or_else(|| ConfigError::InvalidPath {
                    path: path.to_string(),
                    reason: "path has no segments".to_string(),
                })?;
                let nested = rest.iter().rev().fold(ConfigValue::Map(tree), |inner, segment| {
                    let mut map = ConfigMap::new();
                    map.insert(segment.clone(), inner);
                    ConfigValue::Map(map)
                });
                (first.clone(), nested)
            }
            Classification::Unit { chain, .. } => {
                let unit = self.loader.load(&unit_name.unwrap_or_default(), reload)?;
                let map = self.flattener.flatten_chain(&chain, &unit)?;
                (path.dotted(), ConfigValue::Map(map))
            }
        };

        tracing::debug!("Resolved '{}' into key '{}'", path, key);
        self.values.insert(key, value);
        Ok(())
    }

    /// Flattens every unit below `dir` into a tree mirroring the directory layout.
    ///
    /// Entries that cannot be read are logged and skipped rather than failing the
    /// walk. A subdirectory named like a sibling unit is skipped with a warning so
    /// the two never merge under one key; the unit keeps the key.
    fn walk_directory(&mut self, dir: &[String], reload: bool) -> Result<ConfigMap> {
        let base = self.classifier.locator().dir_path(dir);
        let mut tree = ConfigMap::new();
        let mut units: HashSet<Vec<String>> = HashSet::new();

        let settings = self.settings.clone();
        let mut walker = WalkDir::new(&base)
            .follow_links(true)
            .sort_by(units_first)
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || !is_skipped(&settings, entry));

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "walkdir error, skipping entry");
                    continue;
                }
            };

            let relative: Vec<String> = match entry.path().strip_prefix(&base) {
                Ok(relative) => relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect(),
                Err(_) => continue,
            };

            if entry.file_type().is_dir() {
                if units.contains(&relative) {
                    tracing::warn!(
                        "Skipping directory {}: a unit of the same name already holds key '{}'",
                        entry.path().display(),
                        relative.join(".")
                    );
                    walker.skip_current_dir();
                    continue;
                }
                if subtree(&mut tree, &relative).is_none() {
                    tracing::warn!("Directory {} shadows a value", entry.path().display());
                }
                continue;
            }

            if !self.classifier.locator().is_unit_file(entry.path()) {
                continue;
            }

            let Some((file, parents)) = relative.split_last() else {
                continue;
            };
            let Some(stem) = Path::new(file).file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.contains('.') {
                tracing::warn!(
                    "Skipping {}: unit names cannot contain '.'",
                    entry.path().display()
                );
                continue;
            }

            let key: Vec<String> = parents
                .iter()
                .cloned()
                .chain(std::iter::once(stem.to_string()))
                .collect();
            if units.contains(&key) {
                tracing::debug!("Unit '{}' already read from another extension", stem);
                continue;
            }

            let Some(parent) = subtree(&mut tree, parents) else {
                tracing::warn!("Unit {} shadows a value", entry.path().display());
                continue;
            };
            if parent.contains_key(stem) {
                tracing::warn!(
                    "Skipping unit {}: key '{}' is already held by a directory",
                    entry.path().display(),
                    key.join(".")
                );
                continue;
            }

            let unit_name = dir
                .iter()
                .chain(parents)
                .map(String::as_str)
                .chain(std::iter::once(stem))
                .collect::<Vec<_>>()
                .join(".");
            let unit = self.loader.load(&unit_name, reload)?;
            let map = self.flattener.flatten_unit(&unit)?;
            parent.insert(stem.to_string(), ConfigValue::Map(map));
            units.insert(key);
        }

        Ok(tree)
    }
}

fn is_skipped(settings: &EngineSettings, entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if settings.is_skipped_dir(&name) {
        tracing::debug!("Skipping directory {}", entry.path().display());
        return true;
    }
    if name.contains('.') {
        tracing::warn!(
            "Skipping {}: directory names cannot contain '.'",
            entry.path().display()
        );
        return true;
    }
    false
}

/// Orders unit files before subdirectories, each by name.
fn units_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Returns the map at `segments` below `map`, creating empty maps on the way.
///
/// Returns `None` when a segment is already taken by a non-map value.
fn subtree<'m>(map: &'m mut ConfigMap, segments: &[String]) -> Option<&'m mut ConfigMap> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(map);
    };
    match map
        .entry(first.clone())
        .or_insert_with(|| ConfigValue::Map(ConfigMap::new()))
    {
        ConfigValue::Map(inner) => subtree(inner, rest),
        _ => None,
    }
}

impl ConfigResolver for ConfigStore {
    fn resolve(&mut self, path: &str, reload: bool) -> Result<()> {
        let path = ConfigPath::parse(path)?;
        self.resolve_path(&path, reload)
    }

    fn resolve_default(&mut self) -> Result<()> {
        let default_path = self.settings.default_path().to_string();
        self.resolve(&default_path, true)
    }

    fn as_mapping(&self) -> &ConfigMap {
        &self.values
    }
}

/// Builder for constructing a [`ConfigStore`].
///
/// # Examples
///
/// ```rust
/// use figtree::adapters::{FileUnitLoader, YamlUnitParser};
/// use figtree::domain::{EngineSettings, GroupCollisionPolicy};
/// use figtree::service::ConfigStoreBuilder;
///
/// # fn main() -> figtree::domain::Result<()> {
/// let settings = EngineSettings::new(".").with_collision_policy(GroupCollisionPolicy::Error);
/// let store = ConfigStoreBuilder::new()
///     .with_settings(settings)
///     .with_parser(Box::new(YamlUnitParser::new()))
///     .build()?;
/// assert!(store.unit_loader().extensions().contains(&"yaml".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct ConfigStoreBuilder {
    settings: Option<EngineSettings>,
    loader: Option<Box<dyn UnitLoader>>,
    parser: Option<Box<dyn UnitParser>>,
}

impl ConfigStoreBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            settings: None,
            loader: None,
            parser: None,
        }
    }

    /// Sets the engine settings. Defaults to [`EngineSettings::default`].
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Uses `loader` instead of a [`FileUnitLoader`].
    ///
    /// The loader should read units below the same root as the settings.
    pub fn with_loader(mut self, loader: Box<dyn UnitLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Uses `parser` for the default [`FileUnitLoader`]. Ignored when a loader is set.
    pub fn with_parser(mut self, parser: Box<dyn UnitParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Builds the store.
    pub fn build(self) -> Result<ConfigStore> {
        let settings = self.settings.unwrap_or_default();

        let loader = match (self.loader, self.parser) {
            (Some(loader), _) => loader,
            (None, Some(parser)) => Box::new(FileUnitLoader::from_settings(&settings, parser)),
            (None, None) => default_loader(&settings)?,
        };

        let extensions = loader.extensions();
        let locator = UnitLocator::new(settings.root(), extensions.as_slice());
        tracing::debug!(
            "Config store rooted at {} (extensions {:?})",
            settings.root().display(),
            locator.extensions()
        );

        Ok(ConfigStore {
            classifier: PathClassifier::new(locator),
            flattener: HierarchyFlattener::new(settings.collision_policy()),
            settings,
            loader,
            values: ConfigMap::new(),
        })
    }
}

#[cfg(feature = "yaml")]
fn default_loader(settings: &EngineSettings) -> Result<Box<dyn UnitLoader>> {
    use crate::adapters::YamlUnitParser;
    Ok(Box::new(FileUnitLoader::from_settings(
        settings,
        Box::new(YamlUnitParser::new()),
    )))
}

#[cfg(not(feature = "yaml"))]
fn default_loader(_settings: &EngineSettings) -> Result<Box<dyn UnitLoader>> {
    Err(ConfigError::ParseError {
        message: "no unit parser configured; enable the `yaml` feature or set a parser"
            .to_string(),
        source: None,
    })
}

impl Default for ConfigStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
