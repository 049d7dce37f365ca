//! The generic configuration tree.
//!
//! Documents arrive already decoded from their source format. A
//! [`ConfigNode`] is either a scalar, a sequence, or an order-preserving
//! mapping with unique string keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// An order-preserving mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, ConfigNode)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping, rejecting repeated keys.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ConfigNode)>,
        K: Into<String>,
    {
        let mut mapping = Self::new();
        for (key, value) in entries {
            mapping.insert(key, value)?;
        }
        Ok(mapping)
    }

    /// Append a key. Fails if the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigNode) -> Result<()> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(CoreError::DuplicateKey { key });
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Mapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> serde::de::Visitor<'de> for MappingVisitor {
            type Value = Mapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping with unique string keys")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Mapping, A::Error> {
                let mut mapping = Mapping::new();
                while let Some((key, value)) = access.next_entry::<String, ConfigNode>()? {
                    mapping.insert(key, value).map_err(serde::de::Error::custom)?;
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// A node in a decoded configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigNode>),
    Mapping(Mapping),
}

impl ConfigNode {
    /// Shorthand for a string scalar.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Build a mapping node from key/value pairs.
    pub fn mapping<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ConfigNode)>,
        K: Into<String>,
    {
        Mapping::from_entries(entries).map(Self::Mapping)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    /// Name of the node's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigNode {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Mapping(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
