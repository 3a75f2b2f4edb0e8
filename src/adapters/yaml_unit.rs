// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML unit parser.
//!
//! Unit files are YAML mappings. Untagged values are plain data; three local tags give
//! the structure that the flattener works with:
//!
//! ```yaml
//! seed: 7                         # primitive
//! Base: !def                      # nested definition
//!   epochs: 10
//! Trainer: !def
//!   _extends: Base                # parent declared earlier in this unit
//!   _group_name: trainer          # display name used instead of `Trainer`
//!   lr: 0.1
//! Shared: !ref models.base.Base   # definition bound from another unit
//! steps: !group                   # field with a display name
//!   name: num_steps
//!   value: 1000
//! ```

use crate::domain::document::{ParentRef, RawDefinition, RawField, RawFields, RawValue, UnitDocument};
use crate::domain::{ConfigError, ConfigMap, ConfigValue, Result};
use crate::ports::UnitParser;
use serde_yaml::{Mapping, Value};

const TAG_DEFINITION: &str = "def";
const TAG_REFERENCE: &str = "ref";
const TAG_GROUP: &str = "group";

/// Marker key naming a definition's parent.
pub const EXTENDS_KEY: &str = "_extends";

/// Marker key carrying a definition's display name.
pub const GROUP_NAME_KEY: &str = "_group_name";

/// YAML parser implementation for unit files.
///
/// # Examples
///
/// ```rust
/// use figtree::adapters::YamlUnitParser;
/// use figtree::domain::document::RawValue;
/// use figtree::ports::UnitParser;
///
/// let parser = YamlUnitParser::new();
/// let doc = parser.parse("Trainer: !def\n  lr: 0.1\n").unwrap();
/// assert!(matches!(doc.fields["Trainer"].value, RawValue::Definition(_)));
/// ```
#[derive(Debug, Clone)]
pub struct YamlUnitParser;

impl YamlUnitParser {
    /// Creates a new YAML unit parser.
    pub fn new() -> Self {
        YamlUnitParser
    }

    fn fields(map: &Mapping, context: &str) -> Result<RawFields> {
        let mut fields = RawFields::new();
        for (key, value) in map {
            let name = key_str(key, context)?;
            fields.insert(name.to_string(), Self::field(name, value)?);
        }
        Ok(fields)
    }

    fn field(name: &str, value: &Value) -> Result<RawField> {
        let Value::Tagged(tagged) = value else {
            return Ok(RawField::new(RawValue::Primitive(Self::primitive(value, name)?)));
        };

        match tag_name(&tagged.tag).as_str() {
            TAG_DEFINITION => Ok(RawField::new(RawValue::Definition(Self::definition(
                name,
                &tagged.value,
            )?))),
            TAG_REFERENCE => Ok(RawField::new(RawValue::Reference(
                Self::reference(name, &tagged.value)?,
            ))),
            TAG_GROUP => {
                let Value::Mapping(body) = &tagged.value else {
                    return Err(parse_error(format!(
                        "field '{}': !{} expects a mapping with 'name' and 'value'",
                        name, TAG_GROUP
                    )));
                };
                let label = match body.get("name") {
                    None | Some(Value::Null) => name.to_string(),
                    Some(Value::String(label)) => label.clone(),
                    Some(_) => {
                        return Err(parse_error(format!(
                            "field '{}': group name must be a string",
                            name
                        )))
                    }
                };
                let mut field = Self::field(name, body.get("value").unwrap_or(&Value::Null))?;
                field.group = Some(label);
                Ok(field)
            }
            other => Err(parse_error(format!(
                "field '{}': unknown tag '!{}'",
                name, other
            ))),
        }
    }

    fn definition(name: &str, body: &Value) -> Result<RawDefinition> {
        let map = match body {
            Value::Null => return Ok(RawDefinition::default()),
            Value::String(s) if s.is_empty() => return Ok(RawDefinition::default()),
            Value::Mapping(map) => map,
            _ => {
                return Err(parse_error(format!(
                    "definition '{}' must have a mapping body",
                    name
                )))
            }
        };

        let mut def = RawDefinition::default();
        for (key, value) in map {
            match key_str(key, name)? {
                EXTENDS_KEY => def.extends = Some(Self::parent(name, value)?),
                GROUP_NAME_KEY => {
                    def.group = match value {
                        Value::Null => None,
                        Value::String(label) => Some(label.clone()),
                        _ => {
                            return Err(parse_error(format!(
                                "definition '{}': {} must be a string",
                                name, GROUP_NAME_KEY
                            )))
                        }
                    }
                }
                field => {
                    def.fields
                        .insert(field.to_string(), Self::field(field, value)?);
                }
            }
        }
        Ok(def)
    }

    fn parent(name: &str, value: &Value) -> Result<ParentRef> {
        match value {
            Value::String(local) => Ok(ParentRef::Local(local.clone())),
            Value::Tagged(tagged) if tag_name(&tagged.tag) == TAG_REFERENCE => Ok(
                ParentRef::External(Self::reference(name, &tagged.value)?),
            ),
            _ => Err(parse_error(format!(
                "definition '{}': {} must be a name or a !ref",
                name, EXTENDS_KEY
            ))),
        }
    }

    fn reference(name: &str, value: &Value) -> Result<String> {
        match value {
            Value::String(target) if !target.trim().is_empty() => Ok(target.trim().to_string()),
            _ => Err(parse_error(format!(
                "field '{}': !ref expects a dotted definition path",
                name
            ))),
        }
    }

    /// Converts untagged YAML into plain configuration data.
    fn primitive(value: &Value, context: &str) -> Result<ConfigValue> {
        Ok(match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Integer(i),
                None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ConfigValue::String(s.clone()),
            Value::Sequence(items) => ConfigValue::List(
                items
                    .iter()
                    .map(|item| Self::primitive(item, context))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Mapping(map) => {
                let mut out = ConfigMap::new();
                for (key, item) in map {
                    out.insert(key_str(key, context)?.to_string(), Self::primitive(item, context)?);
                }
                ConfigValue::Map(out)
            }
            Value::Tagged(tagged) => {
                return Err(parse_error(format!(
                    "field '{}': tag '{}' is only allowed directly on a field",
                    context, tagged.tag
                )))
            }
        })
    }
}

impl Default for YamlUnitParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitParser for YamlUnitParser {
    fn parse(&self, content: &str) -> Result<UnitDocument> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to parse YAML: {}", e),
            source: Some(Box::new(e)),
        })?;

        match value {
            Value::Null => Ok(UnitDocument::default()),
            Value::Mapping(map) => Ok(UnitDocument {
                fields: Self::fields(&map, "<unit>")?,
            }),
            _ => Err(parse_error("a unit must be a YAML mapping".to_string())),
        }
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

fn tag_name(tag: &serde_yaml::value::Tag) -> String {
    tag.to_string().trim_start_matches('!').to_string()
}

fn key_str<'a>(key: &'a Value, context: &str) -> Result<&'a str> {
    key.as_str()
        .ok_or_else(|| parse_error(format!("'{}': keys must be strings", context)))
}

fn parse_error(message: String) -> ConfigError {
    ConfigError::ParseError {
        message,
        source: None,
    }
}
