//! The validator: applies a [`Schema`] to a [`ConfigNode`].

use std::collections::{HashMap, HashSet};

use ecofan_core::{snake_case, ConfigNode, Identifier, KeyPath};
use tracing::{debug, warn};

use crate::error::{ErrorKind, ValidationError, ValidationReport};
use crate::parser::ValueParser;
use crate::schema::{Presence, Schema, UnknownKeys};
use crate::value::{FieldValue, IdRef, ValidatedNode};

/// Validates entries of one document.
///
/// Holds the per-class counters used to generate identifiers, so one
/// validator should be used for a whole document pass. Generated names skip
/// every name the document writes explicitly; see [`Validator::reserve`].
#[derive(Debug, Default)]
pub struct Validator {
    generated: HashMap<String, usize>,
    taken: HashSet<String>,
    unknown_keys_override: Option<UnknownKeys>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force one unknown-key policy for every schema, ignoring their own.
    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys_override = Some(policy);
        self
    }

    /// Record the identifiers `node` declares explicitly under `schema`, so
    /// generated identifiers never reuse them. Call for every entry of a
    /// document before validating any of them.
    pub fn reserve(&mut self, node: &ConfigNode, schema: &Schema) {
        let Some(mapping) = node.as_mapping() else {
            return;
        };
        for rule in schema.fields() {
            if let Some(value) = mapping.get(&rule.key) {
                self.reserve_value(&rule.parser, value);
            }
        }
    }

    fn reserve_value(&mut self, parser: &ValueParser, node: &ConfigNode) {
        match parser {
            ValueParser::DeclareId { .. } | ValueParser::ExposeId { .. } => {
                if let Some(name) = node.as_str() {
                    self.taken.insert(name.to_string());
                }
            }
            ValueParser::Object(schema) => self.reserve(node, schema),
            ValueParser::ListOf(item) => match node {
                ConfigNode::Sequence(items) => {
                    for child in items {
                        self.reserve_value(item, child);
                    }
                }
                other => self.reserve_value(item, other),
            },
            _ => {}
        }
    }

    /// Validate `node` against `schema`.
    ///
    /// Field errors are collected. Object checks run only when every field
    /// passed, and the first failing check ends validation.
    pub fn validate(
        &mut self,
        node: &ConfigNode,
        schema: &Schema,
        path: &KeyPath,
    ) -> Result<ValidatedNode, ValidationReport> {
        let Some(mapping) = node.as_mapping() else {
            return Err(ValidationError::invalid(
                path.clone(),
                format!("expected a mapping, found {}", node.kind_name()),
            )
            .into());
        };

        let mut fields = Vec::new();
        let mut errors = Vec::new();

        for rule in schema.fields() {
            let field_path = path.key(&rule.key);
            let parsed = match (mapping.get(&rule.key), &rule.presence) {
                (Some(value), _) => Some(rule.parser.parse(value, &field_path, self)),
                (None, Presence::Required) => {
                    errors.push(ValidationError::missing(field_path));
                    None
                }
                (None, Presence::Optional { default: Some(default) }) => {
                    Some(rule.parser.parse(default, &field_path, self))
                }
                (None, Presence::Optional { default: None }) => None,
                (None, Presence::Generated) => self.generate(&rule.parser, &field_path),
            };
            match parsed {
                Some(Ok(value)) => fields.push((rule.key.clone(), value)),
                Some(Err(field_errors)) => errors.extend(field_errors),
                None => {}
            }
        }

        let policy = self.unknown_keys_override.unwrap_or(schema.unknown_keys());
        for key in mapping.keys().filter(|k| schema.rule(k).is_none()) {
            match policy {
                UnknownKeys::Allow => warn!(path = %path, key, "ignoring undeclared key"),
                UnknownKeys::Reject => errors.push(ValidationError::new(
                    ErrorKind::UnknownField,
                    path.key(key),
                    format!("unknown field `{key}`"),
                )),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationReport::new(errors));
        }

        let validated = ValidatedNode::new(path.clone(), fields);
        for check in schema.checks() {
            check.run(&validated).map_err(|message| {
                ValidationError::new(ErrorKind::Object, path.clone(), message)
            })?;
        }
        Ok(validated)
    }

    fn generate(
        &mut self,
        parser: &ValueParser,
        path: &KeyPath,
    ) -> Option<Result<FieldValue, Vec<ValidationError>>> {
        match parser {
            ValueParser::DeclareId { class } => {
                let stem = snake_case(class);
                let counter = self.generated.entry(class.clone()).or_default();
                let name = loop {
                    let name = format!("{stem}_{counter}");
                    *counter += 1;
                    if !self.taken.contains(&name) {
                        break name;
                    }
                };
                self.taken.insert(name.clone());
                let id = match Identifier::new(name) {
                    Ok(id) => id,
                    Err(e) => {
                        return Some(Err(vec![ValidationError::invalid(
                            path.clone(),
                            format!("cannot generate an identifier for {class}: {e}"),
                        )]))
                    }
                };
                debug!(path = %path, id = %id, "generated identifier");
                Some(Ok(FieldValue::Declare {
                    id,
                    class: class.clone(),
                }))
            }
            ValueParser::UseId { class } => Some(Ok(FieldValue::Reference {
                target: IdRef::DefaultOf(class.clone()),
                class: class.clone(),
            })),
            _ => None,
        }
    }
}

/// Validate one node with a fresh [`Validator`].
pub fn validate(
    node: &ConfigNode,
    schema: &Schema,
    path: &KeyPath,
) -> Result<ValidatedNode, ValidationReport> {
    Validator::new().validate(node, schema, path)
}
