// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine settings.
//!
//! [`EngineSettings`] holds everything the resolver needs to know about its
//! environment: where the configuration root is, which path to resolve by default,
//! which directories a subtree walk must skip, and how strictly group names are
//! checked. Settings can be built in code, read from `FIGTREE_*` environment
//! variables, or rooted in the OS configuration directory.

use crate::domain::{ConfigError, ConfigValue, GroupCollisionPolicy, Result};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default upper bound for a unit file (10MB).
pub const DEFAULT_MAX_UNIT_SIZE: u64 = 10 * 1024 * 1024;

/// Default path resolved by [`ConfigResolver::resolve_default`](crate::domain::ConfigResolver::resolve_default).
pub const DEFAULT_PATH: &str = "configs";

/// Directories never descended into by a subtree walk.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["__pycache__", "target", ".cache"];

/// Default prefix of the environment variables read by [`EngineSettings::from_env`].
pub const ENV_PREFIX: &str = "FIGTREE_";

/// Settings shared by the classifier, loader and store.
///
/// # Examples
///
/// ```rust
/// use figtree::domain::{EngineSettings, GroupCollisionPolicy};
///
/// let settings = EngineSettings::new("/srv/app")
///     .with_default_path("configs/models")
///     .skip_dir("generated")
///     .strict_groups(true);
///
/// assert_eq!(settings.default_path(), "configs/models");
/// assert!(settings.is_skipped_dir("generated"));
/// assert_eq!(settings.collision_policy(), GroupCollisionPolicy::Error);
/// ```
#[derive(Clone, Debug)]
pub struct EngineSettings {
    root: PathBuf,
    default_path: String,
    skip_dirs: Vec<String>,
    collision_policy: GroupCollisionPolicy,
    max_unit_size: u64,
}

impl EngineSettings {
    /// Creates default settings rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_path: DEFAULT_PATH.to_string(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
            collision_policy: GroupCollisionPolicy::default(),
            max_unit_size: DEFAULT_MAX_UNIT_SIZE,
        }
    }

    /// Reads settings from `FIGTREE_*` environment variables.
    ///
    /// Recognized variables are `ROOT`, `DEFAULT_PATH`, `SKIP_DIRS` (comma separated,
    /// replaces the defaults), `STRICT_GROUPS` (boolean) and `MAX_UNIT_SIZE` (bytes).
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_env_prefix(ENV_PREFIX)
    }

    /// Reads settings from environment variables with a custom prefix.
    pub fn from_env_prefix(prefix: &str) -> Result<Self> {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Reads settings from an explicit set of variables.
    ///
    /// Variables without `prefix` are ignored. This is what [`from_env_prefix`]
    /// uses with the process environment.
    ///
    /// [`from_env_prefix`]: EngineSettings::from_env_prefix
    pub fn from_vars<I>(prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| key.strip_prefix(prefix).map(|k| (k.to_string(), value)))
            .collect();

        let mut settings = Self::default();

        if let Some(root) = vars.get("ROOT") {
            settings.root = PathBuf::from(root);
        }
        if let Some(path) = vars.get("DEFAULT_PATH") {
            settings.default_path = path.clone();
        }
        if let Some(dirs) = vars.get("SKIP_DIRS") {
            settings.skip_dirs = dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(strict) = vars.get("STRICT_GROUPS") {
            let key = format!("{}STRICT_GROUPS", prefix);
            settings = settings.strict_groups(ConfigValue::from(strict.as_str()).as_bool(&key)?);
        }
        if let Some(size) = vars.get("MAX_UNIT_SIZE") {
            settings.max_unit_size = size
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::from_parse_int_error(format!("{}MAX_UNIT_SIZE", prefix), e))?;
        }

        tracing::debug!(
            "Loaded engine settings from environment (prefix={}, {} variables)",
            prefix,
            vars.len()
        );

        Ok(settings)
    }

    /// Roots the settings in the OS-appropriate configuration directory.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    pub fn user_config_root(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::InvalidPath {
                path: app_name.to_string(),
                reason: "failed to determine project directories".to_string(),
            })?;
        Ok(Self::new(proj_dirs.config_dir()))
    }

    /// Sets the configuration root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the path resolved when no path is given.
    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = path.into();
        self
    }

    /// Replaces the list of skipped directory names.
    pub fn with_skip_dirs<S: Into<String>>(mut self, dirs: impl IntoIterator<Item = S>) -> Self {
        self.skip_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one directory name to skip during subtree walks.
    pub fn skip_dir(mut self, dir: impl Into<String>) -> Self {
        self.skip_dirs.push(dir.into());
        self
    }

    /// Sets the group name collision policy.
    pub fn with_collision_policy(mut self, policy: GroupCollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Shorthand for [`GroupCollisionPolicy::Error`] (`true`) or `Warn` (`false`).
    pub fn strict_groups(self, enabled: bool) -> Self {
        self.with_collision_policy(if enabled {
            GroupCollisionPolicy::Error
        } else {
            GroupCollisionPolicy::Warn
        })
    }

    /// Sets the largest unit file the loader accepts, in bytes.
    pub fn with_max_unit_size(mut self, bytes: u64) -> Self {
        self.max_unit_size = bytes;
        self
    }

    /// The configuration root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path resolved when no path is given.
    pub fn default_path(&self) -> &str {
        &self.default_path
    }

    /// Directory names skipped during subtree walks.
    pub fn skip_dirs(&self) -> &[String] {
        &self.skip_dirs
    }

    /// The group name collision policy.
    pub fn collision_policy(&self) -> GroupCollisionPolicy {
        self.collision_policy
    }

    /// The largest unit file the loader accepts, in bytes.
    pub fn max_unit_size(&self) -> u64 {
        self.max_unit_size
    }

    /// Returns `true` if a walk must not descend into a directory called `name`.
    ///
    /// Hidden directories are always skipped.
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.skip_dirs.iter().any(|d| d == name)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new(".")
    }
}
