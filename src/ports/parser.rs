// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit parser trait definition.
//!
//! This module defines the `UnitParser` trait, which turns the text of a unit file into
//! a [`UnitDocument`]. Parsers know nothing about the filesystem or about other units;
//! references are left as names for the loader to link.

use crate::domain::document::UnitDocument;
use crate::domain::Result;

/// A trait for parsing unit files.
///
/// # Examples
///
/// ```rust
/// use figtree::domain::document::UnitDocument;
/// use figtree::domain::Result;
/// use figtree::ports::UnitParser;
///
/// struct EmptyParser;
///
/// impl UnitParser for EmptyParser {
///     fn parse(&self, _content: &str) -> Result<UnitDocument> {
///         Ok(UnitDocument::default())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["empty"]
///     }
/// }
///
/// let parser = EmptyParser;
/// assert!(parser.parse("anything").unwrap().fields.is_empty());
/// ```
pub trait UnitParser: Send + Sync {
    /// Parses unit file content.
    ///
    /// # Returns
    ///
    /// * `Ok(UnitDocument)` - The declared fields in order
    /// * `Err(ConfigError::ParseError)` - The content is not a valid unit
    fn parse(&self, content: &str) -> Result<UnitDocument>;

    /// Returns the file extensions this parser handles, without the leading dot.
    fn supported_extensions(&self) -> &[&str];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{RawField, RawValue};
    use crate::domain::ConfigValue;

    struct LineParser;

    impl UnitParser for LineParser {
        fn parse(&self, content: &str) -> Result<UnitDocument> {
            let mut doc = UnitDocument::default();
            for line in content.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    doc.fields.insert(
                        key.trim().to_string(),
                        RawField::new(RawValue::Primitive(ConfigValue::from(value.trim()))),
                    );
                }
            }
            Ok(doc)
        }

        fn supported_extensions(&self) -> &[&str] {
            &["ini"]
        }
    }

    #[test]
    fn test_parser_trait() {
        let doc = LineParser.parse("lr = 0.1\nname = adam").unwrap();
        assert_eq!(doc.fields.len(), 2);
        assert_eq!(
            doc.fields["name"].value,
            RawValue::Primitive(ConfigValue::from("adam"))
        );
    }

    #[test]
    fn test_parser_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn UnitParser>>();
    }
}
