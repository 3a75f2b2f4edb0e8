// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem unit loader.
//!
//! This module provides [`FileUnitLoader`], which reads unit files below a root
//! directory, parses them with a [`UnitParser`] and links the result into [`Unit`]
//! snapshots: parents are resolved, and `!ref` style references to other units are
//! loaded through the same cache. [`SharedUnitLoader`] wraps any loader in a mutex so
//! several stores can share one cache.

use crate::domain::document::{ParentRef, RawDefinition, RawFields, RawValue};
use crate::domain::settings::DEFAULT_MAX_UNIT_SIZE;
use crate::domain::unit::Fields;
use crate::domain::{
    Classification, ConfigError, ConfigPath, Definition, EngineSettings, Field, FieldValue,
    PathClassifier, Result, Unit, UnitLocator,
};
use crate::ports::{UnitLoader, UnitParser};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Loads units from files below a root directory and caches the snapshots.
///
/// # Examples
///
/// ```rust,no_run
/// use figtree::adapters::{FileUnitLoader, YamlUnitParser};
/// use figtree::ports::UnitLoader;
///
/// # fn main() -> figtree::domain::Result<()> {
/// let mut loader = FileUnitLoader::new("/srv/app", Box::new(YamlUnitParser::new()));
/// let unit = loader.load("configs.models.train", false)?;
/// println!("{} fields", unit.fields().len());
/// # Ok(())
/// # }
/// ```
pub struct FileUnitLoader {
    /// Classifier used to locate unit files and split reference targets
    classifier: PathClassifier,
    /// Parser for unit file contents
    parser: Box<dyn UnitParser>,
    /// Snapshots keyed by dotted unit name
    cache: HashMap<String, Arc<Unit>>,
    /// Units currently being loaded, outermost first
    loading: Vec<String>,
    /// Largest accepted unit file, in bytes
    max_unit_size: u64,
}

impl FileUnitLoader {
    /// Creates a loader for unit files below `root`.
    pub fn new(root: impl Into<PathBuf>, parser: Box<dyn UnitParser>) -> Self {
        let locator = UnitLocator::new(root, parser.supported_extensions());
        Self {
            classifier: PathClassifier::new(locator),
            parser,
            cache: HashMap::new(),
            loading: Vec::new(),
            max_unit_size: DEFAULT_MAX_UNIT_SIZE,
        }
    }

    /// Creates a loader for YAML unit files below `root`.
    #[cfg(feature = "yaml")]
    pub fn yaml(root: impl Into<PathBuf>) -> Self {
        use crate::adapters::YamlUnitParser;
        Self::new(root, Box::new(YamlUnitParser::new()))
    }

    /// Creates a loader using the root and size limit from `settings`.
    pub fn from_settings(settings: &EngineSettings, parser: Box<dyn UnitParser>) -> Self {
        Self::new(settings.root(), parser).with_max_unit_size(settings.max_unit_size())
    }

    /// Sets the largest unit file the loader accepts, in bytes.
    pub fn with_max_unit_size(mut self, bytes: u64) -> Self {
        self.max_unit_size = bytes;
        self
    }

    /// Returns the configuration root.
    pub fn root(&self) -> &Path {
        self.classifier.locator().root()
    }

    /// Returns the number of cached units.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn load_from(&mut self, unit: &str, path: &Path) -> Result<Unit> {
        let content = self.read_source(unit, path)?;
        let document = self
            .parser
            .parse(&content)
            .map_err(|e| ConfigError::unit_load(unit, "invalid unit document", Some(e)))?;
        let fields = self.link_fields(unit, document.fields, None, &[])?;
        Ok(Unit::new(unit, path, fields))
    }

    fn read_source(&self, unit: &str, path: &Path) -> Result<String> {
        // Check file size before reading to avoid loading huge files
        let metadata = fs::metadata(path).map_err(|e| {
            ConfigError::unit_load(unit, "failed to read file metadata", Some(e.into()))
        })?;

        if metadata.len() > self.max_unit_size {
            return Err(ConfigError::unit_load(
                unit,
                format!(
                    "unit file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    self.max_unit_size
                ),
                None,
            ));
        }

        fs::read_to_string(path)
            .map_err(|e| ConfigError::unit_load(unit, "failed to read unit file", Some(e.into())))
    }

    /// Links raw fields in declaration order.
    ///
    /// `outer` holds the enclosing scopes, outermost first. A definition can name as
    /// parent anything already linked in one of them or earlier in its own scope.
    fn link_fields(
        &mut self,
        unit: &str,
        raw: RawFields,
        prefix: Option<&str>,
        outer: &[&Fields],
    ) -> Result<Fields> {
        let mut fields = Fields::new();

        for (name, raw_field) in raw {
            let value = match raw_field.value {
                RawValue::Primitive(value) => FieldValue::Primitive(value),
                RawValue::Reference(target) => {
                    FieldValue::Reference(self.resolve_reference(unit, &target)?)
                }
                RawValue::Definition(raw_def) => {
                    let qualified = match prefix {
                        Some(prefix) => format!("{}.{}", prefix, name),
                        None => name.clone(),
                    };
                    let mut scopes: Vec<&Fields> = outer.to_vec();
                    scopes.push(&fields);
                    let def = self.link_definition(unit, qualified, raw_def, &scopes)?;
                    FieldValue::Definition(Arc::new(def))
                }
            };
            fields.insert(
                name,
                Field {
                    value,
                    group: raw_field.group,
                },
            );
        }

        Ok(fields)
    }

    fn link_definition(
        &mut self,
        unit: &str,
        qualified: String,
        raw: RawDefinition,
        scopes: &[&Fields],
    ) -> Result<Definition> {
        let parent = match raw.extends {
            None => None,
            Some(ParentRef::Local(path)) => Some(lookup_local(&path, scopes).ok_or_else(|| {
                ConfigError::unit_load(
                    unit,
                    format!(
                        "definition '{}' extends '{}', which is not declared before it",
                        qualified, path
                    ),
                    None,
                )
            })?),
            Some(ParentRef::External(target)) => Some(self.resolve_reference(unit, &target)?),
        };

        let fields = self.link_fields(unit, raw.fields, Some(&qualified), scopes)?;
        Ok(Definition::new(unit, qualified, raw.group, parent, fields))
    }

    /// Resolves a dotted path such as `models.base.Base` to a definition of another unit.
    fn resolve_reference(&mut self, unit: &str, target: &str) -> Result<Arc<Definition>> {
        let wrap = |e: ConfigError| {
            ConfigError::unit_load(unit, format!("cannot resolve reference '{}'", target), Some(e))
        };

        let path = ConfigPath::parse(target).map_err(wrap)?;
        let classification = self.classifier.classify(&path).map_err(wrap)?;
        let (ref_unit, chain) = match (classification.unit_name(), classification) {
            (Some(name), Classification::Unit { chain, .. }) if !chain.is_empty() => (name, chain),
            (_, classification) => {
                let kind = match classification {
                    Classification::Directory { .. } => "a directory",
                    Classification::Unit { .. } => "a unit",
                };
                return Err(ConfigError::unit_load(
                    unit,
                    format!("reference '{}' names {}, not a definition", target, kind),
                    None,
                ));
            }
        };

        tracing::debug!("Unit '{}' references '{}' in unit '{}'", unit, target, ref_unit);
        let loaded = self.load(&ref_unit, false).map_err(wrap)?;

        let mut segments = chain.iter();
        let first = segments.next().map(String::as_str).unwrap_or_default();
        let mut def = loaded.definition(first);
        for segment in segments {
            def = def.and_then(|d| d.child(segment));
        }

        def.cloned().ok_or_else(|| {
            ConfigError::unit_load(
                unit,
                format!("reference '{}' does not name a definition", target),
                None,
            )
        })
    }
}

/// Finds `path` (`Base` or `Outer.Inner`) in the innermost scope that declares its
/// first segment.
fn lookup_local(path: &str, scopes: &[&Fields]) -> Option<Arc<Definition>> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut def = scopes
        .iter()
        .rev()
        .find_map(|scope| scope.get(first).and_then(|f| f.value.definition()))?;
    for segment in segments {
        def = def.child(segment)?;
    }
    Some(Arc::clone(def))
}

impl UnitLoader for FileUnitLoader {
    fn load(&mut self, unit: &str, reload: bool) -> Result<Arc<Unit>> {
        if self.loading.iter().any(|u| u == unit) {
            let mut cycle = self.loading.clone();
            cycle.push(unit.to_string());
            return Err(ConfigError::unit_load(
                unit,
                format!("circular reference: {}", cycle.join(" -> ")),
                None,
            ));
        }

        if !reload {
            if let Some(cached) = self.cache.get(unit) {
                tracing::debug!("Unit cache hit for '{}'", unit);
                return Ok(Arc::clone(cached));
            }
        }

        let path = self
            .classifier
            .locator()
            .locate(unit)
            .ok_or_else(|| ConfigError::UnitNotFound {
                path: unit.replace('.', "/"),
                unit: unit.to_string(),
            })?;

        self.loading.push(unit.to_string());
        let result = self.load_from(unit, &path);
        self.loading.pop();

        let loaded = Arc::new(result?);
        tracing::info!(
            "{} unit '{}' from {}",
            if reload { "Reloaded" } else { "Loaded" },
            unit,
            path.display()
        );
        self.cache.insert(unit.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }

    fn is_cached(&self, unit: &str) -> bool {
        self.cache.contains_key(unit)
    }

    fn invalidate(&mut self, unit: &str) -> bool {
        self.cache.remove(unit).is_some()
    }

    fn clear(&mut self) {
        self.cache.clear();
    }

    fn extensions(&self) -> Vec<String> {
        self.classifier.locator().extensions().to_vec()
    }
}

/// A loader handle that can be cloned and shared between stores and threads.
///
/// All clones use the same underlying loader and therefore the same cache.
///
/// # Examples
///
/// ```rust
/// use figtree::adapters::{FileUnitLoader, SharedUnitLoader};
/// use figtree::ports::UnitLoader;
///
/// let shared = SharedUnitLoader::new(FileUnitLoader::yaml("."));
/// let other = shared.clone();
/// assert_eq!(shared.extensions(), other.extensions());
/// ```
pub struct SharedUnitLoader<L: UnitLoader> {
    inner: Arc<Mutex<L>>,
}

impl<L: UnitLoader> SharedUnitLoader<L> {
    /// Wraps `loader` in a shareable handle.
    pub fn new(loader: L) -> Self {
        Self {
            inner: Arc::new(Mutex::new(loader)),
        }
    }

    /// Locks the underlying loader.
    ///
    /// A poisoned lock is recovered: the cache only ever holds complete snapshots.
    pub fn lock(&self) -> MutexGuard<'_, L> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: UnitLoader> Clone for SharedUnitLoader<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: UnitLoader> UnitLoader for SharedUnitLoader<L> {
    fn load(&mut self, unit: &str, reload: bool) -> Result<Arc<Unit>> {
        self.lock().load(unit, reload)
    }

    fn is_cached(&self, unit: &str) -> bool {
        self.lock().is_cached(unit)
    }

    fn invalidate(&mut self, unit: &str) -> bool {
        self.lock().invalidate(unit)
    }

    fn clear(&mut self) {
        self.lock().clear()
    }

    fn extensions(&self) -> Vec<String> {
        self.lock().extensions()
    }
}

#[cfg(all(test, feature = "yaml"))]
mod tests {
    use super::*;
    use crate::domain::ConfigValue;
    use std::error::Error;
    use tempfile::TempDir;

    fn write(root: &TempDir, rel: &str, content: &str) {
        let path = root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn primitive(unit: &Unit, name: &str) -> ConfigValue {
        match &unit.fields()[name].value {
            FieldValue::Primitive(v) => v.clone(),
            other => panic!("expected primitive, got {:?}", other),
        }
    }

    #[test]
    fn test_load_and_cache() {
        let root = TempDir::new().unwrap();
        write(&root, "models/train.yaml", "lr: 0.1\n");
        let mut loader = FileUnitLoader::yaml(root.path());

        let first = loader.load("models.train", false).unwrap();
        assert_eq!(first.name(), "models.train");
        assert_eq!(primitive(&first, "lr"), ConfigValue::Float(0.1));
        assert!(loader.is_cached("models.train"));

        write(&root, "models/train.yaml", "lr: 0.2\n");
        let cached = loader.load("models.train", false).unwrap();
        assert!(Arc::ptr_eq(&first, &cached));
        assert_eq!(primitive(&cached, "lr"), ConfigValue::Float(0.1));

        let fresh = loader.load("models.train", true).unwrap();
        assert_eq!(primitive(&fresh, "lr"), ConfigValue::Float(0.2));
        assert_eq!(loader.cached_len(), 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let root = TempDir::new().unwrap();
        write(&root, "a.yaml", "x: 1\n");
        write(&root, "b.yaml", "y: 2\n");
        let mut loader = FileUnitLoader::yaml(root.path());

        loader.load("a", false).unwrap();
        loader.load("b", false).unwrap();
        assert!(loader.invalidate("a"));
        assert!(!loader.invalidate("a"));
        assert!(!loader.is_cached("a"));

        loader.clear();
        assert_eq!(loader.cached_len(), 0);
    }

    #[test]
    fn test_missing_unit() {
        let root = TempDir::new().unwrap();
        let mut loader = FileUnitLoader::yaml(root.path());
        assert!(matches!(
            loader.load("models.missing", true),
            Err(ConfigError::UnitNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_document_is_load_error() {
        let root = TempDir::new().unwrap();
        write(&root, "broken.yaml", "invalid: yaml: content:");
        let mut loader = FileUnitLoader::yaml(root.path());
        assert!(matches!(
            loader.load("broken", true),
            Err(ConfigError::UnitLoadError { .. })
        ));
        assert!(!loader.is_cached("broken"));
    }

    #[test]
    fn test_size_limit() {
        let root = TempDir::new().unwrap();
        write(&root, "big.yaml", "payload: 0123456789\n");
        let mut loader = FileUnitLoader::yaml(root.path()).with_max_unit_size(8);
        let err = loader.load("big", true).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_links_local_parents() {
        let root = TempDir::new().unwrap();
        write(
            &root,
            "train.yaml",
            r#"
Base: !def
  epochs: 10
Trainer: !def
  _extends: Base
  lr: 0.1
  Inner: !def
    _extends: Trainer.Nested
  Nested: !def
    depth: 1
"#,
        );
        let mut loader = FileUnitLoader::yaml(root.path());
        let err = loader.load("train", true).unwrap_err();
        // Trainer is not linked yet while its own body is processed.
        assert!(err.to_string().contains("not declared before it"));

        write(
            &root,
            "train.yaml",
            r#"
Base: !def
  epochs: 10
Trainer: !def
  _extends: Base
  lr: 0.1
  Nested: !def
    depth: 1
  Inner: !def
    _extends: Nested
"#,
        );
        let unit = loader.load("train", true).unwrap();
        let trainer = unit.definition("Trainer").unwrap();
        assert_eq!(trainer.parent().unwrap().name(), "Base");
        let inner = trainer.child("Inner").unwrap();
        assert_eq!(inner.qualified_name(), "Trainer.Inner");
        assert_eq!(inner.parent().unwrap().qualified_name(), "Trainer.Nested");
    }

    #[test]
    fn test_links_cross_unit_references() {
        let root = TempDir::new().unwrap();
        write(&root, "models/base.yaml", "Base: !def\n  epochs: 10\n");
        write(
            &root,
            "models/train.yaml",
            "Imported: !ref models.base.Base\nTrainer: !def\n  _extends: !ref models.base.Base\n",
        );
        let mut loader = FileUnitLoader::yaml(root.path());

        let unit = loader.load("models.train", true).unwrap();
        assert!(loader.is_cached("models.base"));

        let imported = &unit.fields()["Imported"].value;
        assert!(matches!(imported, FieldValue::Reference(def) if def.unit() == "models.base"));
        let trainer = unit.definition("Trainer").unwrap();
        assert_eq!(trainer.parent().unwrap().path(), "models.base.Base");
    }

    #[test]
    fn test_reference_errors() {
        let root = TempDir::new().unwrap();
        write(&root, "models/base.yaml", "Base: !def {}\n");
        write(&root, "unit_only.yaml", "X: !ref models.base\n");
        write(&root, "missing_def.yaml", "X: !ref models.base.Nope\n");
        write(&root, "dir_only.yaml", "X: !ref models\n");
        let mut loader = FileUnitLoader::yaml(root.path());

        for unit in ["unit_only", "missing_def", "dir_only"] {
            assert!(
                matches!(loader.load(unit, true), Err(ConfigError::UnitLoadError { .. })),
                "{}",
                unit
            );
        }
    }

    #[test]
    fn test_circular_reference() {
        let root = TempDir::new().unwrap();
        write(&root, "a.yaml", "A: !def {}\nB: !ref b.B\n");
        write(&root, "b.yaml", "B: !def {}\nA: !ref a.A\n");
        let mut loader = FileUnitLoader::yaml(root.path());

        let err = loader.load("a", true).unwrap_err();
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        assert!(message.contains("circular reference: a -> b -> a"));
        assert!(loader.loading.is_empty());
    }

    #[test]
    fn test_shared_loader_shares_cache() {
        let root = TempDir::new().unwrap();
        write(&root, "a.yaml", "x: 1\n");
        let mut shared = SharedUnitLoader::new(FileUnitLoader::yaml(root.path()));
        let other = shared.clone();

        shared.load("a", false).unwrap();
        assert!(other.is_cached("a"));
        assert_eq!(other.extensions(), vec!["yaml".to_string(), "yml".to_string()]);
    }
}
