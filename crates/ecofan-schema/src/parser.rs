//! Field value parsers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ecofan_core::{ConfigNode, CoreError, Identifier, KeyPath, RfAddress};

use crate::error::{ErrorKind, ValidationError};
use crate::schema::Schema;
use crate::validate::Validator;
use crate::value::{ActionCall, FieldValue, IdRef};

/// The key an action's referenced instance is written under.
pub const ID_KEY: &str = "id";

type CustomFn = dyn Fn(&ConfigNode) -> Result<FieldValue, String> + Send + Sync;

/// A named parser supplied by a component definition.
#[derive(Clone)]
pub struct CustomParser {
    name: &'static str,
    parse: Arc<CustomFn>,
}

impl CustomParser {
    pub fn new<F>(name: &'static str, parse: F) -> Self
    where
        F: Fn(&ConfigNode) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        Self {
            name,
            parse: Arc::new(parse),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for CustomParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomParser").field(&self.name).finish()
    }
}

/// Schemas for the actions that may appear in an action list, by action name.
#[derive(Debug, Clone, Default)]
pub struct ActionSchemas {
    schemas: BTreeMap<String, Schema>,
}

impl ActionSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

/// How a field's raw node becomes a [`FieldValue`].
#[derive(Debug, Clone)]
pub enum ValueParser {
    /// Identity.
    Any,
    /// A string scalar; other scalars are rejected.
    String,
    Boolean,
    Integer { min: Option<i64>, max: Option<i64> },
    /// One of a fixed set of lowercase strings, matched case-insensitively.
    OneOf(Vec<String>),
    /// An RF address in `XX:XX:XX` form.
    Address,
    /// Declares this entry's identifier for an instance of `class`.
    DeclareId { class: String },
    /// Refers to another entry's instance of `class`.
    UseId { class: String },
    /// Declares an identifier for the sub-instance returned by `accessor`.
    ExposeId { class: String, accessor: String },
    /// A nested object.
    Object(Box<Schema>),
    /// A list of values; a single value is taken as a one-element list.
    ListOf(Box<ValueParser>),
    /// A list of single-key action mappings.
    Actions(Arc<ActionSchemas>),
    Custom(CustomParser),
}

impl ValueParser {
    pub fn declare_id(class: impl Into<String>) -> Self {
        Self::DeclareId {
            class: class.into(),
        }
    }

    pub fn use_id(class: impl Into<String>) -> Self {
        Self::UseId {
            class: class.into(),
        }
    }

    pub fn expose_id(class: impl Into<String>, accessor: impl Into<String>) -> Self {
        Self::ExposeId {
            class: class.into(),
            accessor: accessor.into(),
        }
    }

    pub fn object(schema: Schema) -> Self {
        Self::Object(Box::new(schema))
    }

    pub fn list_of(item: ValueParser) -> Self {
        Self::ListOf(Box::new(item))
    }

    pub fn one_of(options: &[&str]) -> Self {
        Self::OneOf(options.iter().map(|s| s.to_ascii_lowercase()).collect())
    }

    pub fn int_range(min: i64, max: i64) -> Self {
        Self::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::OneOf(_) => "one_of",
            Self::Address => "rf_address",
            Self::DeclareId { .. } => "declare_id",
            Self::UseId { .. } => "use_id",
            Self::ExposeId { .. } => "expose_id",
            Self::Object(_) => "object",
            Self::ListOf(_) => "list",
            Self::Actions(_) => "actions",
            Self::Custom(c) => c.name(),
        }
    }

    /// Parse `node`, located at `path`.
    pub fn parse(
        &self,
        node: &ConfigNode,
        path: &KeyPath,
        validator: &mut Validator,
    ) -> Result<FieldValue, Vec<ValidationError>> {
        let single = |message: String| vec![ValidationError::invalid(path.clone(), message)];

        match self {
            Self::Any => Ok(FieldValue::Node(node.clone())),
            Self::String => string_strict(node)
                .map(|s| FieldValue::Node(ConfigNode::string(s)))
                .map_err(single),
            Self::Boolean => node
                .as_bool()
                .map(|b| FieldValue::Node(ConfigNode::Bool(b)))
                .ok_or_else(|| single(expected("a boolean", node))),
            Self::Integer { min, max } => {
                let n = node
                    .as_i64()
                    .ok_or_else(|| single(expected("an integer", node)))?;
                if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
                    return Err(single(format!(
                        "value {n} is out of range [{}, {}]",
                        min.map_or("-inf".to_string(), |v| v.to_string()),
                        max.map_or("inf".to_string(), |v| v.to_string()),
                    )));
                }
                Ok(FieldValue::Node(ConfigNode::Integer(n)))
            }
            Self::OneOf(options) => {
                let s = string_strict(node).map_err(single)?.to_ascii_lowercase();
                if options.contains(&s) {
                    Ok(FieldValue::Node(ConfigNode::String(s)))
                } else {
                    Err(single(format!(
                        "unknown value '{s}', expected one of: {}",
                        options.join(", ")
                    )))
                }
            }
            Self::Address => {
                let text = string_strict(node).map_err(single)?;
                RfAddress::parse(text)
                    .map(FieldValue::Address)
                    .map_err(|e| match e {
                        CoreError::InvalidFormat { reason, .. } => vec![ValidationError::new(
                            ErrorKind::InvalidFormat,
                            path.clone(),
                            reason,
                        )],
                        other => single(other.to_string()),
                    })
            }
            Self::DeclareId { class } => Ok(FieldValue::Declare {
                id: identifier(node).map_err(single)?,
                class: class.clone(),
            }),
            Self::UseId { class } => Ok(FieldValue::Reference {
                target: IdRef::Named(identifier(node).map_err(single)?),
                class: class.clone(),
            }),
            Self::ExposeId { class, accessor } => Ok(FieldValue::Expose {
                id: identifier(node).map_err(single)?,
                class: class.clone(),
                accessor: accessor.clone(),
            }),
            Self::Object(schema) => validator
                .validate(node, schema, path)
                .map(FieldValue::Object)
                .map_err(|report| report.errors),
            Self::ListOf(item) => {
                let items = ensure_list(node);
                let mut values = Vec::with_capacity(items.len());
                let mut errors = Vec::new();
                for (i, child) in items.iter().enumerate() {
                    match item.parse(child, &path.index(i), validator) {
                        Ok(v) => values.push(v),
                        Err(e) => errors.extend(e),
                    }
                }
                if errors.is_empty() {
                    Ok(FieldValue::List(values))
                } else {
                    Err(errors)
                }
            }
            Self::Actions(schemas) => parse_actions(node, path, schemas, validator),
            Self::Custom(custom) => (custom.parse)(node).map_err(single),
        }
    }
}

fn expected(what: &str, node: &ConfigNode) -> String {
    format!("expected {what}, found {}", node.kind_name())
}

fn string_strict(node: &ConfigNode) -> Result<&str, String> {
    node.as_str().ok_or_else(|| expected("a string", node))
}

fn identifier(node: &ConfigNode) -> Result<Identifier, String> {
    let name = string_strict(node)?;
    Identifier::new(name).map_err(|e| e.to_string())
}

fn ensure_list(node: &ConfigNode) -> Vec<ConfigNode> {
    match node {
        ConfigNode::Sequence(items) => items.clone(),
        ConfigNode::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn parse_actions(
    node: &ConfigNode,
    path: &KeyPath,
    schemas: &ActionSchemas,
    validator: &mut Validator,
) -> Result<FieldValue, Vec<ValidationError>> {
    let mut calls = Vec::new();
    let mut errors = Vec::new();

    for (i, item) in ensure_list(node).iter().enumerate() {
        let item_path = path.index(i);
        let Some(mapping) = item.as_mapping().filter(|m| m.len() == 1) else {
            errors.push(ValidationError::invalid(
                item_path,
                "an action must be a mapping with exactly one key",
            ));
            continue;
        };
        let Some((name, args)) = mapping.iter().next() else {
            continue;
        };
        let args_path = item_path.key(name);
        let Some(schema) = schemas.get(name) else {
            errors.push(ValidationError::invalid(
                args_path,
                format!("unknown action '{name}'"),
            ));
            continue;
        };

        // `action: some_id` is shorthand for `action: {id: some_id}`.
        let args = if args.is_scalar() && !matches!(args, ConfigNode::Null) {
            match ConfigNode::mapping([(ID_KEY, args.clone())]) {
                Ok(expanded) => expanded,
                Err(e) => {
                    errors.push(ValidationError::invalid(args_path, e.to_string()));
                    continue;
                }
            }
        } else {
            args.clone()
        };

        match validator.validate(&args, schema, &args_path) {
            Ok(config) => calls.push(ActionCall {
                name: name.to_string(),
                config,
            }),
            Err(report) => errors.extend(report.errors),
        }
    }

    if errors.is_empty() {
        Ok(FieldValue::Actions(calls))
    } else {
        Err(errors)
    }
}
