// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration path newtype for type-safe query handling.
//!
//! A `ConfigPath` is the normalized form of a query such as `models.train.Trainer` or
//! `models/train/Trainer`. Dots, backslashes and slashes are interchangeable separators;
//! the normalized form always uses `/` and never carries a leading or trailing slash.

use crate::domain::errors::{ConfigError, Result};
use std::fmt;
use std::str::FromStr;

/// A normalized, slash-separated configuration path.
///
/// # Examples
///
/// ```
/// use figtree::domain::ConfigPath;
///
/// let path = ConfigPath::parse("models.train/Trainer/").unwrap();
/// assert_eq!(path.as_str(), "models/train/Trainer");
/// assert_eq!(path.segments().collect::<Vec<_>>(), vec!["models", "train", "Trainer"]);
/// assert_eq!(path.dotted(), "models.train.Trainer");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConfigPath(String);

impl ConfigPath {
    /// Normalizes and validates a raw query string.
    ///
    /// Fails with [`ConfigError::InvalidPath`] when the path has no segments, starts
    /// with a separator, or contains an empty segment (`a//b`, `a..b`).
    pub fn parse(input: &str) -> Result<Self> {
        let normalized: String = input
            .chars()
            .map(|c| if c == '.' || c == '\\' { '/' } else { c })
            .collect();
        let normalized = normalized.trim_end_matches('/');

        if normalized.is_empty() {
            return Err(invalid(input, "path has no segments"));
        }
        if normalized.starts_with('/') {
            return Err(invalid(input, "path must be relative to the configuration root"));
        }
        if normalized.split('/').any(str::is_empty) {
            return Err(invalid(input, "path contains an empty segment"));
        }

        Ok(ConfigPath(normalized.to_string()))
    }

    /// Builds a path from already separated segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/");
        Self::parse(&joined)
    }

    /// Returns the normalized path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// A parsed path always has at least one segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the first segment, which is the top-level key of directory queries.
    pub fn first(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Returns the path with `.` separators, the form used for unit names and store keys.
    pub fn dotted(&self) -> String {
        self.0.replace('/', ".")
    }
}

fn invalid(input: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidPath {
        path: input.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for ConfigPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ConfigPath {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<ConfigPath> for String {
    fn from(path: ConfigPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ConfigPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slashes() {
        let path = ConfigPath::parse("models/train/Trainer").unwrap();
        assert_eq!(path.as_str(), "models/train/Trainer");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_parse_dots_and_backslashes() {
        let path = ConfigPath::parse("models.train\\Trainer").unwrap();
        assert_eq!(path.as_str(), "models/train/Trainer");
    }

    #[test]
    fn test_trailing_separators_trimmed() {
        let path = ConfigPath::parse("configs//").unwrap();
        assert_eq!(path.as_str(), "configs");
        assert_eq!(path.first(), "configs");
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(
            ConfigPath::parse(""),
            Err(ConfigError::InvalidPath { .. })
        ));
        assert!(ConfigPath::parse("/").is_err());
        assert!(ConfigPath::parse("...").is_err());
    }

    #[test]
    fn test_leading_separator_rejected() {
        assert!(ConfigPath::parse("/etc/configs").is_err());
        assert!(ConfigPath::parse("../secrets").is_err());
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(ConfigPath::parse("models//train").is_err());
        assert!(ConfigPath::parse("models..train").is_err());
    }

    #[test]
    fn test_dotted() {
        let path = ConfigPath::parse("configs/sub/b").unwrap();
        assert_eq!(path.dotted(), "configs.sub.b");
    }

    #[test]
    fn test_from_segments() {
        let path = ConfigPath::from_segments(&["models", "train"]).unwrap();
        assert_eq!(path.as_str(), "models/train");
        assert!(ConfigPath::from_segments::<&str>(&[]).is_err());
    }

    #[test]
    fn test_from_str_and_display() {
        let path: ConfigPath = "a.b".parse().unwrap();
        assert_eq!(format!("{}", path), "a/b");
        let s: String = path.into();
        assert_eq!(s, "a/b");
    }
}
