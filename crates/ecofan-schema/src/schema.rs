//! Schema declarations and composition.
//!
//! A [`Schema`] is an ordered list of field rules plus whole-object checks.
//! Schemas are immutable values: [`Schema::extend`] returns a new schema in
//! which the other schema's rules override shared keys in place, so the
//! original declaration order survives every merge.

use std::fmt;
use std::sync::Arc;

use ecofan_core::ConfigNode;

use crate::parser::ValueParser;
use crate::value::ValidatedNode;

/// Whether a key must be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    /// Optional, with a default that is parsed like a supplied value.
    Optional { default: Option<ConfigNode> },
    /// Optional; when absent an identifier is generated (declarations) or
    /// the single instance of the referenced class is used (references).
    Generated,
}

/// The rule for one key.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub key: String,
    pub presence: Presence,
    pub parser: ValueParser,
}

impl FieldRule {
    pub fn new(key: impl Into<String>, presence: Presence, parser: ValueParser) -> Self {
        Self {
            key: key.into(),
            presence,
            parser,
        }
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }
}

/// What to do with keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Ignore them silently.
    #[default]
    Allow,
    /// Report each one as an error.
    Reject,
}

type CheckFn = dyn Fn(&ValidatedNode) -> Result<(), String> + Send + Sync;

/// A whole-object predicate, run after every field validated.
#[derive(Clone)]
pub enum ObjectCheck {
    /// When `field` is present it must differ from `other`.
    Distinct {
        field: String,
        other: String,
        message: String,
    },
    /// Component-supplied predicate.
    Custom { name: String, check: Arc<CheckFn> },
}

impl ObjectCheck {
    pub fn distinct(
        field: impl Into<String>,
        other: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Distinct {
            field: field.into(),
            other: other.into(),
            message: message.into(),
        }
    }

    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ValidatedNode) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Run the check. The error is the failure message.
    pub fn run(&self, node: &ValidatedNode) -> Result<(), String> {
        match self {
            Self::Distinct {
                field,
                other,
                message,
            } => match (node.get(field), node.get(other)) {
                (Some(a), Some(b)) if a == b => {
                    Err(format!("{message} (`{field}` equals `{other}`)"))
                }
                _ => Ok(()),
            },
            Self::Custom { check, .. } => check(node),
        }
    }
}

impl fmt::Debug for ObjectCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distinct { field, other, .. } => f
                .debug_struct("Distinct")
                .field("field", field)
                .field("other", other)
                .finish(),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

/// An ordered set of field rules plus object-level checks.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldRule>,
    unknown_keys: UnknownKeys,
    checks: Vec<ObjectCheck>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a rule. A replaced rule keeps its original position.
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.upsert(rule);
        self
    }

    pub fn required(self, key: impl Into<String>, parser: ValueParser) -> Self {
        self.field(FieldRule::new(key, Presence::Required, parser))
    }

    pub fn optional(self, key: impl Into<String>, parser: ValueParser) -> Self {
        self.field(FieldRule::new(
            key,
            Presence::Optional { default: None },
            parser,
        ))
    }

    pub fn optional_default(
        self,
        key: impl Into<String>,
        parser: ValueParser,
        default: ConfigNode,
    ) -> Self {
        self.field(FieldRule::new(
            key,
            Presence::Optional {
                default: Some(default),
            },
            parser,
        ))
    }

    pub fn generated(self, key: impl Into<String>, parser: ValueParser) -> Self {
        self.field(FieldRule::new(key, Presence::Generated, parser))
    }

    pub fn check(mut self, check: ObjectCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Merge `other` into a copy of this schema.
    ///
    /// The key set is the union; for shared keys `other`'s rule wins but
    /// keeps this schema's position. Checks are concatenated, this schema's
    /// first. The unknown-key policy of `self` is kept.
    pub fn extend(&self, other: &Schema) -> Schema {
        let mut merged = self.clone();
        for rule in &other.fields {
            merged.upsert(rule.clone());
        }
        merged.checks.extend(other.checks.iter().cloned());
        merged
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|r| r.key == key)
    }

    pub fn checks(&self) -> &[ObjectCheck] {
        &self.checks
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    fn upsert(&mut self, rule: FieldRule) {
        match self.fields.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => *existing = rule,
            None => self.fields.push(rule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;
    use ecofan_core::KeyPath;

    fn keys(schema: &Schema) -> Vec<&str> {
        schema.fields().iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn extension_overrides_shared_keys() {
        let base = Schema::new().required("a", ValueParser::Any);
        let ext = Schema::new()
            .optional("a", ValueParser::Any)
            .required("b", ValueParser::Any);

        let merged = base.extend(&ext);
        assert!(!merged.rule("a").unwrap().is_required());
        assert!(merged.rule("b").unwrap().is_required());
        assert_eq!(keys(&merged), vec!["a", "b"]);
        // the base schema is untouched
        assert!(base.rule("a").unwrap().is_required());
    }

    #[test]
    fn override_keeps_original_position() {
        let base = Schema::new()
            .required("id", ValueParser::Any)
            .required("x", ValueParser::Any)
            .required("y", ValueParser::Any);
        let ext = Schema::new()
            .required("z", ValueParser::Any)
            .optional("x", ValueParser::Any);
        assert_eq!(keys(&base.extend(&ext)), vec!["id", "x", "y", "z"]);
    }

    #[test]
    fn extend_is_associative() {
        let a = Schema::new().required("k", ValueParser::Any).required("a", ValueParser::Any);
        let b = Schema::new().optional("k", ValueParser::String).required("b", ValueParser::Any);
        let c = Schema::new().required("k", ValueParser::Boolean).required("c", ValueParser::Any);

        let left = a.extend(&b).extend(&c);
        let right = a.extend(&b.extend(&c));
        assert_eq!(keys(&left), keys(&right));
        for (l, r) in left.fields().iter().zip(right.fields()) {
            assert_eq!(l.presence, r.presence);
            assert_eq!(l.parser.name(), r.parser.name());
        }
    }

    #[test]
    fn checks_are_concatenated() {
        let a = Schema::new().check(ObjectCheck::distinct("p", "q", "same"));
        let b = Schema::new().check(ObjectCheck::custom("always", |_| Ok(())));
        let merged = a.extend(&b);
        assert_eq!(merged.checks().len(), 2);
        assert!(matches!(merged.checks()[0], ObjectCheck::Distinct { .. }));
    }

    #[test]
    fn distinct_only_fires_when_both_present() {
        let check = ObjectCheck::distinct("peer", "own", "must differ");
        let same = FieldValue::Node(ConfigNode::from("x"));
        let both = ValidatedNode::new(
            KeyPath::root(),
            vec![("own".into(), same.clone()), ("peer".into(), same.clone())],
        );
        let only_own = ValidatedNode::new(KeyPath::root(), vec![("own".into(), same)]);

        let msg = check.run(&both).unwrap_err();
        assert!(msg.contains("`peer`") && msg.contains("`own`"));
        assert!(check.run(&only_own).is_ok());
    }
}
