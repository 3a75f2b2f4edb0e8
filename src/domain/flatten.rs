// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchy flattening.
//!
//! Turns units and definition chains into plain [`ConfigMap`]s. Inherited fields are
//! merged most general ancestor first so that a descendant's field replaces its
//! ancestor's, group names replace storage names as keys, and definitions declared in
//! the unit being flattened are inlined as nested mappings.

use crate::domain::unit::{is_reserved, Definition, Field, FieldValue, Fields, Unit};
use crate::domain::{ConfigError, ConfigMap, ConfigValue, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// What to do when two fields of one mapping resolve to the same effective name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupCollisionPolicy {
    /// Log a warning; the later field wins.
    #[default]
    Warn,
    /// Fail with [`ConfigError::GroupNameCollision`].
    Error,
}

/// Flattens units and definition chains into ordered mappings.
///
/// # Examples
///
/// ```
/// use figtree::domain::unit::{Definition, Field, FieldValue, Fields, Unit};
/// use figtree::domain::{ConfigValue, HierarchyFlattener};
/// use std::sync::Arc;
///
/// # fn main() -> figtree::domain::Result<()> {
/// let mut base = Fields::new();
/// base.insert("epochs".into(), Field::new(FieldValue::Primitive(ConfigValue::from(10))));
/// let base = Arc::new(Definition::new("models.train", "Base", None, None, base));
///
/// let mut trainer = Fields::new();
/// trainer.insert("lr".into(), Field::new(FieldValue::Primitive(ConfigValue::from(0.1))));
/// let trainer = Definition::new("models.train", "Trainer", None, Some(base.clone()), trainer);
///
/// let mut fields = Fields::new();
/// fields.insert("Base".into(), Field::new(FieldValue::Definition(base)));
/// fields.insert("Trainer".into(), Field::new(FieldValue::Definition(Arc::new(trainer))));
/// let unit = Unit::new("models.train", "models/train.yaml", fields);
///
/// let flat = HierarchyFlattener::default().flatten_chain(&["Trainer"], &unit)?;
/// assert_eq!(flat.get("epochs"), Some(&ConfigValue::from(10)));
/// assert_eq!(flat.get("lr"), Some(&ConfigValue::from(0.1)));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct HierarchyFlattener {
    policy: GroupCollisionPolicy,
}

impl HierarchyFlattener {
    /// Creates a flattener with the given collision policy.
    pub fn new(policy: GroupCollisionPolicy) -> Self {
        Self { policy }
    }

    /// Flattens every non-reserved top-level field of `unit`.
    pub fn flatten_unit(&self, unit: &Unit) -> Result<ConfigMap> {
        tracing::debug!("Flattening unit '{}'", unit.name());
        self.emit(
            unit.fields().iter().map(|(name, field)| (name.as_str(), field)),
            unit.name(),
        )
    }

    /// Resolves `chain` inside `unit` and flattens the definition it names.
    ///
    /// An empty chain flattens the whole unit.
    pub fn flatten_chain<S: AsRef<str>>(&self, chain: &[S], unit: &Unit) -> Result<ConfigMap> {
        match self.find_definition(chain, unit)? {
            Some(def) => {
                tracing::debug!("Flattening definition '{}'", def.path());
                self.linearize(def, unit.name())
            }
            None => self.flatten_unit(unit),
        }
    }

    /// Walks `chain` from the unit's top-level scope, one nested definition per segment.
    ///
    /// Each segment first matches a definition's group name and only then its storage
    /// name. Returns `None` for an empty chain.
    pub fn find_definition<'u, S: AsRef<str>>(
        &self,
        chain: &[S],
        unit: &'u Unit,
    ) -> Result<Option<&'u Arc<Definition>>> {
        let mut scope = unit.fields();
        let mut found = None;

        for (depth, segment) in chain.iter().enumerate() {
            let segment = segment.as_ref();
            let def = self.select(scope, segment, unit.name())?.ok_or_else(|| {
                let walked: Vec<&str> = chain[..=depth].iter().map(|s| s.as_ref()).collect();
                ConfigError::DefinitionNotFound {
                    path: format!("{}.{}", unit.name(), walked.join(".")),
                    segment: segment.to_string(),
                }
            })?;
            scope = def.fields();
            found = Some(def);
        }

        Ok(found)
    }

    /// Merges a definition with its ancestors into one mapping.
    fn linearize(&self, def: &Definition, unit_name: &str) -> Result<ConfigMap> {
        let mut merged: IndexMap<&str, &Field> = IndexMap::new();
        for ancestor in def.linearization() {
            for (name, field) in ancestor.fields() {
                if !is_reserved(name) {
                    merged.insert(name.as_str(), field);
                }
            }
        }
        self.emit(merged.into_iter(), unit_name)
    }

    fn emit<'a>(
        &self,
        fields: impl Iterator<Item = (&'a str, &'a Field)>,
        unit_name: &str,
    ) -> Result<ConfigMap> {
        let mut out = ConfigMap::new();
        let mut claimed: HashMap<&'a str, &'a str> = HashMap::new();

        for (name, field) in fields {
            if is_reserved(name) {
                continue;
            }
            let key = field.effective_name(name);
            if let Some(previous) = claimed.insert(key, name) {
                if previous != name {
                    self.collision(key, previous, name, unit_name)?;
                }
            }
            out.insert(key.to_string(), self.materialize(&field.value, unit_name)?);
        }

        Ok(out)
    }

    fn materialize(&self, value: &FieldValue, unit_name: &str) -> Result<ConfigValue> {
        match value {
            FieldValue::Primitive(v) => Ok(v.clone()),
            FieldValue::Definition(def) | FieldValue::Reference(def) if def.unit() == unit_name => {
                Ok(ConfigValue::Map(self.linearize(def, unit_name)?))
            }
            FieldValue::Definition(def) | FieldValue::Reference(def) => {
                Ok(ConfigValue::Reference(def.path()))
            }
        }
    }

    /// Picks the definition in `scope` named `segment`, preferring group names.
    ///
    /// Sibling definitions sharing the group name go through the collision policy;
    /// under `Warn` the later one wins, as in [`flatten_unit`](Self::flatten_unit).
    fn select<'a>(
        &self,
        scope: &'a Fields,
        segment: &str,
        unit_name: &str,
    ) -> Result<Option<&'a Arc<Definition>>> {
        let mut by_group: Option<(&'a str, &'a Arc<Definition>)> = None;
        for (name, field) in scope.iter().filter(|(name, _)| !is_reserved(name)) {
            let Some(def) = field.value.definition() else {
                continue;
            };
            if field.group_name() != Some(segment) {
                continue;
            }
            if let Some((previous, _)) = by_group {
                self.collision(segment, previous, name, unit_name)?;
            }
            by_group = Some((name.as_str(), def));
        }

        if let Some((_, def)) = by_group {
            return Ok(Some(def));
        }

        Ok(scope
            .get(segment)
            .filter(|_| !is_reserved(segment))
            .and_then(|field| field.value.definition()))
    }

    fn collision(&self, key: &str, first: &str, second: &str, unit_name: &str) -> Result<()> {
        match self.policy {
            GroupCollisionPolicy::Warn => {
                tracing::warn!(
                    "Group name '{}' in unit '{}' is claimed by both '{}' and '{}'; keeping '{}'",
                    key,
                    unit_name,
                    first,
                    second,
                    second
                );
                Ok(())
            }
            GroupCollisionPolicy::Error => Err(ConfigError::GroupNameCollision {
                name: key.to_string(),
                first: first.to_string(),
                second: second.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(v: impl Into<ConfigValue>) -> Field {
        Field::new(FieldValue::Primitive(v.into()))
    }

    fn def(
        unit: &str,
        name: &str,
        group: Option<&str>,
        parent: Option<&Arc<Definition>>,
        fields: Vec<(&str, Field)>,
    ) -> Arc<Definition> {
        Arc::new(Definition::new(
            unit,
            name,
            group.map(str::to_string),
            parent.cloned(),
            fields.into_iter().map(|(k, f)| (k.to_string(), f)).collect(),
        ))
    }

    fn local(d: &Arc<Definition>) -> Field {
        Field::new(FieldValue::Definition(Arc::clone(d)))
    }

    fn unit(fields: Vec<(&str, Field)>) -> Unit {
        Unit::new(
            "models.train",
            "models/train.yaml",
            fields.into_iter().map(|(k, f)| (k.to_string(), f)).collect(),
        )
    }

    /// `A'` <- `B'` <- `C`, with `C` nested as `A/B/C`.
    fn three_level_unit() -> Unit {
        let a_base = def("models.train", "ABase", None, None, vec![
            ("shared", primitive("from_a")),
            ("only_a", primitive(1)),
        ]);
        let b_base = def("models.train", "BBase", None, Some(&a_base), vec![("only_b", primitive(2))]);
        let c = def("models.train", "A.B.C", None, Some(&b_base), vec![
            ("shared", primitive("from_c")),
            ("only_c", primitive(3)),
        ]);
        let b = def("models.train", "A.B", None, None, vec![("C", local(&c))]);
        let a = def("models.train", "A", None, None, vec![("B", local(&b))]);
        unit(vec![
            ("ABase", local(&a_base)),
            ("BBase", local(&b_base)),
            ("A", local(&a)),
        ])
    }

    #[test]
    fn test_flatten_chain_linearizes_ancestors() {
        let unit = three_level_unit();
        let flat = HierarchyFlattener::default()
            .flatten_chain(&["A", "B", "C"], &unit)
            .unwrap();

        assert_eq!(flat.get("only_a"), Some(&ConfigValue::from(1)));
        assert_eq!(flat.get("only_b"), Some(&ConfigValue::from(2)));
        assert_eq!(flat.get("only_c"), Some(&ConfigValue::from(3)));
        assert_eq!(flat.get("shared"), Some(&ConfigValue::from("from_c")));
    }

    #[test]
    fn test_override_keeps_ancestor_position() {
        let unit = three_level_unit();
        let flat = HierarchyFlattener::default()
            .flatten_chain(&["A", "B", "C"], &unit)
            .unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["shared", "only_a", "only_b", "only_c"]);
    }

    #[test]
    fn test_flatten_unit_inlines_local_definitions() {
        let unit = three_level_unit();
        let flat = HierarchyFlattener::default().flatten_unit(&unit).unwrap();

        let c = flat.get("A").and_then(|a| a.lookup("B.C")).unwrap();
        assert_eq!(c.lookup("shared"), Some(&ConfigValue::from("from_c")));
        assert_eq!(c.lookup("only_a"), Some(&ConfigValue::from(1)));
        assert_eq!(
            flat.get("BBase").and_then(|b| b.lookup("only_a")),
            Some(&ConfigValue::from(1))
        );
    }

    #[test]
    fn test_group_name_renames_field() {
        let unit = unit(vec![
            ("x", primitive(5).grouped("y")),
            ("z", primitive(6)),
        ]);
        let flat = HierarchyFlattener::default().flatten_unit(&unit).unwrap();
        assert_eq!(flat.get("y"), Some(&ConfigValue::from(5)));
        assert!(flat.get("x").is_none());
        assert_eq!(flat.get("z"), Some(&ConfigValue::from(6)));
    }

    #[test]
    fn test_chain_prefers_group_name() {
        let adam = def("models.train", "Adam", Some("optim"), None, vec![("lr", primitive(0.001))]);
        let optim = def("models.train", "optim", None, None, vec![("lr", primitive(1.0))]);
        let unit = unit(vec![("optim", local(&optim)), ("Adam", local(&adam))]);

        let flat = HierarchyFlattener::default()
            .flatten_chain(&["optim"], &unit)
            .unwrap();
        assert_eq!(flat.get("lr"), Some(&ConfigValue::from(0.001)));

        let flat = HierarchyFlattener::default()
            .flatten_chain(&["Adam"], &unit)
            .unwrap();
        assert_eq!(flat.get("lr"), Some(&ConfigValue::from(0.001)));
    }

    #[test]
    fn test_chain_ignores_primitives() {
        let unit = unit(vec![("Trainer", primitive("not a definition"))]);
        let err = HierarchyFlattener::default()
            .flatten_chain(&["Trainer"], &unit)
            .unwrap_err();
        match err {
            ConfigError::DefinitionNotFound { segment, path } => {
                assert_eq!(segment, "Trainer");
                assert_eq!(path, "models.train.Trainer");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_chain_missing_inner_segment() {
        let unit = three_level_unit();
        let err = HierarchyFlattener::default()
            .flatten_chain(&["A", "X", "C"], &unit)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DefinitionNotFound { ref segment, .. } if segment == "X"
        ));
    }

    #[test]
    fn test_empty_chain_flattens_unit() {
        let unit = unit(vec![("seed", primitive(7))]);
        let flat = HierarchyFlattener::default()
            .flatten_chain::<&str>(&[], &unit)
            .unwrap();
        assert_eq!(flat.get("seed"), Some(&ConfigValue::from(7)));
    }

    #[test]
    fn test_reserved_names_excluded() {
        let unit = unit(vec![
            ("group", primitive("decorator")),
            ("_group_name", primitive("marker")),
            ("__doc__", primitive("doc")),
            ("kept", primitive(true)),
        ]);
        let flat = HierarchyFlattener::default().flatten_unit(&unit).unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["kept"]);
    }

    #[test]
    fn test_foreign_definitions_stay_references() {
        let base = def("models.base", "Base", None, None, vec![("epochs", primitive(10))]);
        let unit = unit(vec![("Base", Field::new(FieldValue::Reference(Arc::clone(&base))))]);

        let flat = HierarchyFlattener::default().flatten_unit(&unit).unwrap();
        assert_eq!(
            flat.get("Base"),
            Some(&ConfigValue::Reference("models.base.Base".to_string()))
        );

        // Navigating into an imported definition still linearizes its fields.
        let flat = HierarchyFlattener::default()
            .flatten_chain(&["Base"], &unit)
            .unwrap();
        assert_eq!(flat.get("epochs"), Some(&ConfigValue::from(10)));
    }

    #[test]
    fn test_collision_warns_by_default() {
        let unit = unit(vec![
            ("adam", primitive("a").grouped("optim")),
            ("sgd", primitive("s").grouped("optim")),
        ]);
        let flat = HierarchyFlattener::default().flatten_unit(&unit).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.get("optim"), Some(&ConfigValue::from("s")));
    }

    #[test]
    fn test_collision_errors_when_strict() {
        let unit = unit(vec![
            ("optim", primitive("plain")),
            ("adam", primitive("a").grouped("optim")),
        ]);
        let err = HierarchyFlattener::new(GroupCollisionPolicy::Error)
            .flatten_unit(&unit)
            .unwrap_err();
        match err {
            ConfigError::GroupNameCollision { name, first, second } => {
                assert_eq!(name, "optim");
                assert_eq!(first, "optim");
                assert_eq!(second, "adam");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_chain_group_collision_errors_when_strict() {
        let adam = def("models.train", "Adam", Some("optim"), None, vec![("lr", primitive(1))]);
        let sgd = def("models.train", "Sgd", Some("optim"), None, vec![("lr", primitive(2))]);
        let unit = unit(vec![("Adam", local(&adam)), ("Sgd", local(&sgd))]);

        let err = HierarchyFlattener::new(GroupCollisionPolicy::Error)
            .flatten_chain(&["optim"], &unit)
            .unwrap_err();
        match err {
            ConfigError::GroupNameCollision { name, first, second } => {
                assert_eq!(name, "optim");
                assert_eq!(first, "Adam");
                assert_eq!(second, "Sgd");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Storage names stay unambiguous
        let flat = HierarchyFlattener::new(GroupCollisionPolicy::Error)
            .flatten_chain(&["Adam"], &unit)
            .unwrap();
        assert_eq!(flat.get("lr"), Some(&ConfigValue::from(1)));
    }

    #[test]
    fn test_chain_group_collision_warns_and_keeps_later() {
        let adam = def("models.train", "Adam", Some("optim"), None, vec![("lr", primitive(1))]);
        let sgd = def("models.train", "Sgd", Some("optim"), None, vec![("lr", primitive(2))]);
        let unit = unit(vec![("Adam", local(&adam)), ("Sgd", local(&sgd))]);

        let flattener = HierarchyFlattener::default();
        let chained = flattener.flatten_chain(&["optim"], &unit).unwrap();
        assert_eq!(chained.get("lr"), Some(&ConfigValue::from(2)));

        let whole = flattener.flatten_unit(&unit).unwrap();
        assert_eq!(whole.get("optim"), Some(&ConfigValue::Map(chained)));
    }
}
