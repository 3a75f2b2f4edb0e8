// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsed, not yet linked, unit documents.
//!
//! Parsers produce a [`UnitDocument`]: the declared fields of a unit with parents and
//! cross-unit references still expressed by name. The loader links a document into a
//! [`Unit`](crate::domain::Unit) by resolving those names.

use crate::domain::ConfigValue;
use indexmap::IndexMap;

/// Ordered raw fields keyed by storage name.
pub type RawFields = IndexMap<String, RawField>;

/// The parsed contents of one unit file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitDocument {
    /// Top-level fields in declaration order.
    pub fields: RawFields,
}

/// A declared field before linking.
#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    /// The declared value.
    pub value: RawValue,
    /// Group name attached to the field.
    pub group: Option<String>,
}

impl RawField {
    /// Creates an ungrouped field.
    pub fn new(value: RawValue) -> Self {
        Self { value, group: None }
    }
}

/// A declared value before linking.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// Plain data.
    Primitive(ConfigValue),
    /// A nested definition declared in place.
    Definition(RawDefinition),
    /// A definition in another unit, by dotted path (`models.base.Base`).
    Reference(String),
}

/// A nested definition before linking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDefinition {
    /// The declared parent, if any.
    pub extends: Option<ParentRef>,
    /// The definition's own group name.
    pub group: Option<String>,
    /// Declared fields, excluding the `_extends` and `_group_name` markers.
    pub fields: RawFields,
}

/// How a definition names its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// A definition declared earlier in an enclosing scope of the same unit, by dotted
    /// storage path (`Base` or `Outer.Inner`).
    Local(String),
    /// A definition in another unit, by full dotted path.
    External(String),
}
