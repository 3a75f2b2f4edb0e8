// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loaded units and the definitions they declare.
//!
//! A [`Unit`] is the in-memory symbol table of one configuration file. Its fields hold
//! either primitive values or [`Definition`]s, which carry their own fields and an
//! optional parent. Units and definitions are immutable snapshots shared through `Arc`;
//! a reload produces a new snapshot instead of mutating the old one.

use crate::domain::ConfigValue;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Field names that never appear in a flattened mapping.
///
/// `_group_name` carries a definition's display name, `group` is the grouping
/// annotation's own identifier and `_extends` names a definition's parent.
pub const RESERVED_NAMES: &[&str] = &["_group_name", "group", "_extends"];

/// Returns `true` for engine-internal field names.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("__") || RESERVED_NAMES.contains(&name)
}

/// Ordered symbol table of a unit or definition, keyed by storage name.
pub type Fields = IndexMap<String, Field>;

/// A named entry of a symbol table.
#[derive(Clone, Debug)]
pub struct Field {
    /// The value bound to the field.
    pub value: FieldValue,
    /// Display name attached to the field itself.
    pub group: Option<String>,
}

impl Field {
    /// Creates a field without a group name.
    pub fn new(value: FieldValue) -> Self {
        Self { value, group: None }
    }

    /// Attaches a group name to the field.
    pub fn grouped(mut self, name: impl Into<String>) -> Self {
        self.group = Some(name.into());
        self
    }

    /// Returns the group name that applies to this field.
    ///
    /// A name attached to the field wins; otherwise a definition's own group name is
    /// used.
    pub fn group_name(&self) -> Option<&str> {
        match (&self.group, self.value.definition()) {
            (Some(group), _) => Some(group.as_str()),
            (None, Some(def)) => def.group(),
            (None, None) => None,
        }
    }

    /// Returns the key the field is merged under: its group name, else `storage_name`.
    pub fn effective_name<'a>(&'a self, storage_name: &'a str) -> &'a str {
        match self.group_name() {
            Some(group) => group,
            None => storage_name,
        }
    }
}

/// The value bound to a field.
#[derive(Clone, Debug)]
pub enum FieldValue {
    /// Plain data.
    Primitive(ConfigValue),
    /// A definition declared in the enclosing unit.
    Definition(Arc<Definition>),
    /// A definition bound from another unit.
    Reference(Arc<Definition>),
}

impl FieldValue {
    /// Returns the definition behind `Definition` and `Reference` values.
    pub fn definition(&self) -> Option<&Arc<Definition>> {
        match self {
            FieldValue::Primitive(_) => None,
            FieldValue::Definition(def) | FieldValue::Reference(def) => Some(def),
        }
    }
}

/// A class-like definition nested in a unit.
#[derive(Debug)]
pub struct Definition {
    name: String,
    qualified_name: String,
    unit: String,
    group: Option<String>,
    parent: Option<Arc<Definition>>,
    fields: Fields,
}

impl Definition {
    /// Creates a definition.
    ///
    /// `qualified_name` is the dotted containment path inside `unit`, for example
    /// `Trainer.Optimizer`.
    pub fn new(
        unit: impl Into<String>,
        qualified_name: impl Into<String>,
        group: Option<String>,
        parent: Option<Arc<Definition>>,
        fields: Fields,
    ) -> Self {
        let qualified_name = qualified_name.into();
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            qualified_name,
            unit: unit.into(),
            group,
            parent,
            fields,
        }
    }

    /// The storage name the definition was declared under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted containment path inside the owning unit.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The dotted name of the owning unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Fully qualified dotted path, `<unit>.<qualified_name>`.
    pub fn path(&self) -> String {
        format!("{}.{}", self.unit, self.qualified_name)
    }

    /// The definition's own group name.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The direct parent, if any.
    pub fn parent(&self) -> Option<&Arc<Definition>> {
        self.parent.as_ref()
    }

    /// Fields declared directly on this definition, without inherited ones.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Iterates over this definition and its ancestors, nearest first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Returns the inheritance chain most general ancestor first, ending with `self`.
    pub fn linearization(&self) -> Vec<&Definition> {
        let mut chain: Vec<&Definition> = self.ancestors().collect();
        chain.reverse();
        chain
    }

    /// Looks up a directly declared nested definition by storage name.
    pub fn child(&self, name: &str) -> Option<&Arc<Definition>> {
        self.fields.get(name).and_then(|f| f.value.definition())
    }
}

/// Iterator over a definition and its ancestors, see [`Definition::ancestors`].
pub struct Ancestors<'a> {
    next: Option<&'a Definition>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Definition;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// The in-memory symbol table of one unit file.
#[derive(Debug)]
pub struct Unit {
    name: String,
    source: PathBuf,
    fields: Fields,
}

impl Unit {
    /// Creates a unit from its dotted name, source file and top-level fields.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            fields,
        }
    }

    /// The dotted unit name, e.g. `models.train`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file the unit was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Looks up a top-level definition by storage name.
    pub fn definition(&self, name: &str) -> Option<&Arc<Definition>> {
        self.fields.get(name).and_then(|f| f.value.definition())
    }
}
