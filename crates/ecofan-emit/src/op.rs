//! The emitted operation sequence.

use std::fmt;

use ecofan_core::{ConfigNode, Identifier, UintLiteral};
use serde::Serialize;

/// A structural role an instance is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Generic component lifecycle (setup/loop).
    Component,
    /// Attachment to an SPI bus.
    SpiDevice,
    /// A fan entity.
    FanEntity,
    /// A script holding an action list.
    Script,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::SpiDevice => "spi-device",
            Self::FanEntity => "fan-entity",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value carried by an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OpValue {
    /// An encoded unsigned integer, e.g. an RF address.
    Literal(UintLiteral),
    /// An opaque configuration value.
    Node(ConfigNode),
    /// A previously constructed instance.
    Instance(Identifier),
    List(Vec<OpValue>),
    /// A nested object's fields.
    Object(Vec<Arg>),
}

/// A named argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub name: String,
    pub value: OpValue,
}

impl Arg {
    pub fn new(name: impl Into<String>, value: OpValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// How a constructed instance comes into being.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Init {
    /// A fresh instance built from the arguments.
    New { args: Vec<OpValue> },
    /// The sub-instance a parent hands out through `accessor`.
    Exposed { parent: Identifier, accessor: String },
}

/// One step of the emitted program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Construct {
        id: Identifier,
        class: String,
        init: Init,
    },
    SetField {
        id: Identifier,
        field: String,
        value: OpValue,
    },
    Register {
        id: Identifier,
        role: Role,
        args: Vec<Arg>,
    },
    Expose {
        id: Identifier,
        sub_id: Identifier,
        class: String,
        accessor: String,
    },
}

impl Operation {
    /// The identifier the operation acts on.
    pub fn subject(&self) -> &Identifier {
        match self {
            Self::Construct { id, .. }
            | Self::SetField { id, .. }
            | Self::Register { id, .. }
            | Self::Expose { id, .. } => id,
        }
    }

    /// Identifiers this operation reads besides its subject.
    pub fn consumes(&self) -> Vec<&Identifier> {
        let mut out = Vec::new();
        match self {
            Self::Construct { init, .. } => match init {
                Init::New { args } => args.iter().for_each(|v| collect_instances(v, &mut out)),
                Init::Exposed { parent, .. } => out.push(parent),
            },
            Self::SetField { value, .. } => collect_instances(value, &mut out),
            Self::Register { args, .. } => args
                .iter()
                .for_each(|a| collect_instances(&a.value, &mut out)),
            Self::Expose { .. } => {}
        }
        out
    }
}

fn collect_instances<'a>(value: &'a OpValue, out: &mut Vec<&'a Identifier>) {
    match value {
        OpValue::Instance(id) => out.push(id),
        OpValue::List(items) => items.iter().for_each(|v| collect_instances(v, out)),
        OpValue::Object(args) => args.iter().for_each(|a| collect_instances(&a.value, out)),
        OpValue::Literal(_) | OpValue::Node(_) => {}
    }
}

impl fmt::Display for OpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Node(node) => write!(f, "{node}"),
            Self::Instance(id) => write!(f, "&{id}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(args) => {
                write!(f, "{{")?;
                write_args(f, args)?;
                write!(f, "}}")
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Arg]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", arg.name, arg.value)?;
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct { id, class, init } => match init {
                Init::New { args } => {
                    write!(f, "construct {id}: {class}(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ")")
                }
                Init::Exposed { parent, accessor } => {
                    write!(f, "construct {id}: {class} = {parent}.{accessor}()")
                }
            },
            Self::SetField { id, field, value } => write!(f, "set {id}.{field} = {value}"),
            Self::Register { id, role, args } => {
                write!(f, "register {id} as {role}")?;
                if !args.is_empty() {
                    write!(f, " (")?;
                    write_args(f, args)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Expose {
                id,
                sub_id,
                class,
                accessor,
            } => write!(f, "expose {sub_id}: {class} = {id}.{accessor}()"),
        }
    }
}
