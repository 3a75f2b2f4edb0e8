// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path classification.
//!
//! Splits a [`ConfigPath`] into the part that names a directory below the root, the
//! segment that names a unit file inside that directory, and the chain of nested
//! definitions inside the unit.

use crate::domain::{ConfigError, ConfigPath, Result};
use std::path::{Path, PathBuf};

/// Finds unit files below a root directory.
#[derive(Clone, Debug)]
pub struct UnitLocator {
    root: PathBuf,
    extensions: Vec<String>,
}

impl UnitLocator {
    /// Creates a locator for unit files with any of `extensions` below `root`.
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, extensions: &[S]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.as_ref().to_string()).collect(),
        }
    }

    /// The configuration root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Supported unit file extensions, in lookup order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Maps directory segments to a filesystem path below the root.
    pub fn dir_path<S: AsRef<str>>(&self, segments: &[S]) -> PathBuf {
        segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment.as_ref()))
    }

    /// Returns the file of unit `name` inside the directory named by `dir`.
    pub fn unit_file<S: AsRef<str>>(&self, dir: &[S], name: &str) -> Option<PathBuf> {
        let dir_path = self.dir_path(dir);
        self.extensions
            .iter()
            .map(|ext| dir_path.join(format!("{}.{}", name, ext)))
            .find(|candidate| candidate.is_file())
    }

    /// Returns the file of a dotted unit name such as `models.train`.
    pub fn locate(&self, unit: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = unit.split('.').collect();
        let (name, dir) = segments.split_last()?;
        self.unit_file(dir, name)
    }

    /// Returns `true` when `path` has one of the supported extensions.
    pub fn is_unit_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}

/// The result of classifying a configuration path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The whole path names a directory.
    Directory {
        /// Directory segments below the root.
        dir: Vec<String>,
    },
    /// The path names a unit, optionally followed by a definition chain.
    Unit {
        /// Segments of the directory containing the unit; empty for the root.
        dir: Vec<String>,
        /// Base name of the unit file.
        unit: String,
        /// Definition names after the unit, outermost first.
        chain: Vec<String>,
    },
}

impl Classification {
    /// The dotted unit name (`models.train`) for unit classifications.
    pub fn unit_name(&self) -> Option<String> {
        match self {
            Classification::Directory { .. } => None,
            Classification::Unit { dir, unit, .. } => {
                let mut segments = dir.clone();
                segments.push(unit.clone());
                Some(segments.join("."))
            }
        }
    }
}

/// Classifies configuration paths against the filesystem below a root.
///
/// # Examples
///
/// ```no_run
/// use figtree::domain::{Classification, ConfigPath, PathClassifier, UnitLocator};
///
/// # fn main() -> figtree::domain::Result<()> {
/// let classifier = PathClassifier::new(UnitLocator::new("/srv/app", &["yaml"]));
/// let path = ConfigPath::parse("configs/models/train.Trainer")?;
/// if let Classification::Unit { unit, chain, .. } = classifier.classify(&path)? {
///     println!("unit {} chain {:?}", unit, chain);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PathClassifier {
    locator: UnitLocator,
}

impl PathClassifier {
    /// Creates a classifier using `locator` for filesystem lookups.
    pub fn new(locator: UnitLocator) -> Self {
        Self { locator }
    }

    /// The locator the classifier checks unit files with.
    pub fn locator(&self) -> &UnitLocator {
        &self.locator
    }

    /// Classifies `path`.
    ///
    /// The longest directory prefix wins, down to the root itself. The segment after it
    /// must name a unit file and every remaining segment becomes a definition chain
    /// entry.
    pub fn classify(&self, path: &ConfigPath) -> Result<Classification> {
        let segments: Vec<String> = path.segments().map(str::to_string).collect();

        if self.locator.dir_path(&segments).is_dir() {
            tracing::debug!("Classified '{}' as a directory", path);
            return Ok(Classification::Directory { dir: segments });
        }

        let prefix_len = (0..segments.len())
            .rev()
            .find(|&len| self.locator.dir_path(&segments[..len]).is_dir())
            .ok_or_else(|| ConfigError::DirectoryNotFound {
                path: path.to_string(),
            })?;

        let dir = segments[..prefix_len].to_vec();
        let unit = segments[prefix_len].clone();
        if self.locator.unit_file(&dir, &unit).is_none() {
            let mut expected = dir.clone();
            expected.push(unit);
            return Err(ConfigError::UnitNotFound {
                path: path.to_string(),
                unit: expected.join("."),
            });
        }

        let chain = segments[prefix_len + 1..].to_vec();
        tracing::debug!(
            "Classified '{}' as unit '{}' in '{}' with chain {:?}",
            path,
            unit,
            dir.join("/"),
            chain
        );
        Ok(Classification::Unit { dir, unit, chain })
    }
}
