// SPDX-License-Identifier: MIT OR Apache-2.0

//! Materialized configuration values.
//!
//! This module provides the `ConfigValue` tree produced by flattening units and
//! definitions, together with type-safe conversion methods to common Rust types.
//! Values in the tree are always plain data: primitives, lists and nested mappings.

use crate::domain::errors::{ConfigError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// An ordered mapping from effective field names to values.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// A materialized configuration value.
///
/// # Examples
///
/// ```
/// use figtree::domain::{ConfigMap, ConfigValue};
///
/// let mut trainer = ConfigMap::new();
/// trainer.insert("epochs".to_string(), ConfigValue::from(10));
/// trainer.insert("lr".to_string(), ConfigValue::from(0.1));
/// let value = ConfigValue::Map(trainer);
///
/// assert_eq!(value.lookup("epochs").unwrap().as_i64("epochs").unwrap(), 10);
/// assert!(value.lookup("momentum").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<ConfigValue>),
    /// A nested mapping, either plain data or an inlined definition.
    Map(ConfigMap),
    /// A definition owned by another unit, kept by its dotted name instead of being
    /// expanded.
    Reference(String),
}

impl ConfigValue {
    /// Returns a short name of the value's kind, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "mapping",
            ConfigValue::Reference(_) => "reference",
        }
    }

    /// Returns `true` for [`ConfigValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Returns the string content of `String` and `Reference` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) | ConfigValue::Reference(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested mapping, if this value is one.
    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the list items, if this value is a list.
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the value to a boolean.
    ///
    /// Booleans convert directly. Strings are recognized case-insensitively:
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        match self {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::Integer(0) => Ok(false),
            ConfigValue::Integer(1) => Ok(true),
            ConfigValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(true),
                "false" | "no" | "0" | "off" => Ok(false),
                _ => s
                    .parse::<bool>()
                    .map_err(|e| ConfigError::from_parse_bool_error(key.to_string(), e)),
            },
            other => Err(ConfigError::type_mismatch(key, "boolean", other.kind())),
        }
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self, key: &str) -> Result<i64> {
        match self {
            ConfigValue::Integer(n) => Ok(*n),
            ConfigValue::String(s) => s
                .parse::<i64>()
                .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e)),
            other => Err(ConfigError::type_mismatch(key, "integer", other.kind())),
        }
    }

    /// Converts the value to a `u64`.
    pub fn as_u64(&self, key: &str) -> Result<u64> {
        match self {
            ConfigValue::Integer(n) => u64::try_from(*n).map_err(|e| {
                ConfigError::TypeConversionError {
                    key: key.to_string(),
                    target_type: "u64".to_string(),
                    source: Box::new(e),
                }
            }),
            ConfigValue::String(s) => s
                .parse::<u64>()
                .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e)),
            other => Err(ConfigError::type_mismatch(key, "u64", other.kind())),
        }
    }

    /// Converts the value to an `f64`. Integers widen losslessly where possible.
    pub fn as_f64(&self, key: &str) -> Result<f64> {
        match self {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Integer(n) => Ok(*n as f64),
            ConfigValue::String(s) => s
                .parse::<f64>()
                .map_err(|e| ConfigError::from_parse_float_error(key.to_string(), e)),
            other => Err(ConfigError::type_mismatch(key, "float", other.kind())),
        }
    }

    /// Parses a scalar value into any type that implements `FromStr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use figtree::domain::ConfigValue;
    /// use std::net::IpAddr;
    ///
    /// let value = ConfigValue::from("127.0.0.1");
    /// let ip: IpAddr = value.parse("server.host").unwrap();
    /// assert_eq!(ip.to_string(), "127.0.0.1");
    /// ```
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let text = match self {
            ConfigValue::Map(_) | ConfigValue::List(_) | ConfigValue::Null => {
                return Err(ConfigError::type_mismatch(
                    key,
                    std::any::type_name::<T>(),
                    self.kind(),
                ))
            }
            scalar => scalar.to_string(),
        };
        text.parse::<T>()
            .map_err(|e| ConfigError::TypeConversionError {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Box::new(e),
            })
    }

    /// Walks nested mappings by a dotted key such as `optimizer.lr`.
    pub fn lookup(&self, dotted: &str) -> Option<&ConfigValue> {
        dotted
            .split('.')
            .try_fold(self, |current, segment| current.as_map()?.get(segment))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Integer(n)
    }
}

impl From<i32> for ConfigValue {
    fn from(n: i32) -> Self {
        ConfigValue::Integer(n.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::String(s) | ConfigValue::Reference(s) => write!(f, "{}", s),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ConfigValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn sample() -> ConfigValue {
        let mut optimizer = ConfigMap::new();
        optimizer.insert("lr".to_string(), ConfigValue::from(0.01));
        optimizer.insert("name".to_string(), ConfigValue::from("adam"));
        let mut root = ConfigMap::new();
        root.insert("optimizer".to_string(), ConfigValue::Map(optimizer));
        root.insert("epochs".to_string(), ConfigValue::from(10));
        ConfigValue::Map(root)
    }

    #[test]
    fn test_lookup_nested() {
        let value = sample();
        assert_eq!(
            value.lookup("optimizer.name").and_then(ConfigValue::as_str),
            Some("adam")
        );
        assert_eq!(value.lookup("epochs"), Some(&ConfigValue::Integer(10)));
    }

    #[test]
    fn test_lookup_missing() {
        let value = sample();
        assert!(value.lookup("optimizer.momentum").is_none());
        assert!(value.lookup("epochs.inner").is_none());
    }

    #[test]
    fn test_as_bool_variants() {
        assert!(ConfigValue::Bool(true).as_bool("k").unwrap());
        for val in ["true", "Yes", "1", "ON"] {
            assert!(ConfigValue::from(val).as_bool("k").unwrap(), "{}", val);
        }
        for val in ["false", "No", "0", "OFF"] {
            assert!(!ConfigValue::from(val).as_bool("k").unwrap(), "{}", val);
        }
        assert!(ConfigValue::from("maybe").as_bool("k").is_err());
        assert!(ConfigValue::Float(1.0).as_bool("k").is_err());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(ConfigValue::Integer(42).as_i64("k").unwrap(), 42);
        assert_eq!(ConfigValue::from("-7").as_i64("k").unwrap(), -7);
        assert_eq!(ConfigValue::Integer(42).as_u64("k").unwrap(), 42);
        assert!(ConfigValue::Integer(-1).as_u64("k").is_err());
        assert_eq!(ConfigValue::Integer(3).as_f64("k").unwrap(), 3.0);
        assert_eq!(ConfigValue::Float(0.5).as_f64("k").unwrap(), 0.5);
        assert!(ConfigValue::from("abc").as_f64("k").is_err());
    }

    #[test]
    fn test_conversion_error_names_key() {
        let err = ConfigValue::Map(ConfigMap::new())
            .as_i64("trainer.epochs")
            .unwrap_err();
        assert!(err.to_string().contains("trainer.epochs"));
    }

    #[test]
    fn test_parse_custom_type() {
        let value = ConfigValue::from("127.0.0.1");
        let ip: IpAddr = value.parse("host").unwrap();
        assert_eq!(ip.to_string(), "127.0.0.1");

        let port: u16 = ConfigValue::Integer(8080).parse("port").unwrap();
        assert_eq!(port, 8080);

        let result: Result<IpAddr> = ConfigValue::Null.parse("host");
        assert!(result.is_err());
    }

    #[test]
    fn test_reference_reads_as_str() {
        let value = ConfigValue::Reference("models.base.Base".to_string());
        assert_eq!(value.as_str(), Some("models.base.Base"));
        assert_eq!(value.kind(), "reference");
    }

    #[test]
    fn test_display() {
        let list = ConfigValue::List(vec![ConfigValue::from(1), ConfigValue::from("a")]);
        assert_eq!(list.to_string(), "[1, a]");
        assert_eq!(sample().to_string(), "{optimizer: {lr: 0.01, name: adam}, epochs: 10}");
    }
}
