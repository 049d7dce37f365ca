//! Values produced by field parsers and the validated entry that holds them.

use ecofan_core::{ConfigNode, Identifier, KeyPath, RfAddress};

/// The target of an identifier reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdRef {
    /// An explicitly named instance.
    Named(Identifier),
    /// The single instance of the given class, resolved once every entry has been declared.
    DefaultOf(String),
}

/// A typed field value after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Passed through unchanged (identity parser, plain scalars, opaque pin configs).
    Node(ConfigNode),
    /// A parsed RF address.
    Address(RfAddress),
    /// The identifier this entry declares for its own instance.
    Declare { id: Identifier, class: String },
    /// A reference to another entry's instance.
    Reference { target: IdRef, class: String },
    /// A new identifier bound to a sub-instance of this entry's instance.
    Expose {
        id: Identifier,
        class: String,
        accessor: String,
    },
    /// A nested object validated against its own schema.
    Object(ValidatedNode),
    /// A sequence of parsed values.
    List(Vec<FieldValue>),
    /// Action invocations, in the order written.
    Actions(Vec<ActionCall>),
}

/// One action invocation such as `itho_ecofanrft.join: hub`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    /// Registered action name.
    pub name: String,
    /// Validated action arguments.
    pub config: ValidatedNode,
}

/// A reference found while walking a validated entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSite<'a> {
    pub path: KeyPath,
    pub target: &'a IdRef,
    pub class: &'a str,
}

/// A mapping that passed its schema, fields in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedNode {
    path: KeyPath,
    fields: Vec<(String, FieldValue)>,
}

impl ValidatedNode {
    pub fn new(path: KeyPath, fields: Vec<(String, FieldValue)>) -> Self {
        Self { path, fields }
    }

    /// Location of this object in the document.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first identifier declared directly on this object.
    pub fn declared(&self) -> Option<(&str, &Identifier, &str)> {
        self.iter().find_map(|(key, value)| match value {
            FieldValue::Declare { id, class } => Some((key, id, class.as_str())),
            _ => None,
        })
    }

    /// Every sub-instance exposure declared directly on this object.
    pub fn exposures(&self) -> Vec<(&str, &Identifier, &str, &str)> {
        self.iter()
            .filter_map(|(key, value)| match value {
                FieldValue::Expose {
                    id,
                    class,
                    accessor,
                } => Some((key, id, class.as_str(), accessor.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Every identifier reference in this object, nested objects and actions included.
    pub fn references(&self) -> Vec<ReferenceSite<'_>> {
        let mut out = Vec::new();
        for (key, value) in &self.fields {
            collect_refs(value, self.path.key(key), &mut out);
        }
        out
    }

    /// Every action invocation in this object, in field order, nested objects included.
    pub fn action_calls(&self) -> Vec<&ActionCall> {
        let mut out = Vec::new();
        for (_, value) in &self.fields {
            collect_actions(value, &mut out);
        }
        out
    }
}

fn collect_actions<'a>(value: &'a FieldValue, out: &mut Vec<&'a ActionCall>) {
    match value {
        FieldValue::Actions(calls) => out.extend(calls.iter()),
        FieldValue::Object(node) => out.extend(node.action_calls()),
        FieldValue::List(items) => {
            for item in items {
                collect_actions(item, out);
            }
        }
        _ => {}
    }
}

fn collect_refs<'a>(value: &'a FieldValue, path: KeyPath, out: &mut Vec<ReferenceSite<'a>>) {
    match value {
        FieldValue::Reference { target, class } => out.push(ReferenceSite {
            path,
            target,
            class,
        }),
        FieldValue::Object(node) => out.extend(node.references()),
        FieldValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_refs(item, path.index(i), out);
            }
        }
        FieldValue::Actions(calls) => {
            for call in calls {
                out.extend(call.config.references());
            }
        }
        FieldValue::Node(_)
        | FieldValue::Address(_)
        | FieldValue::Declare { .. }
        | FieldValue::Expose { .. } => {}
    }
}
