//! Per-entry emission.
//!
//! An entry is emitted in a fixed order: construction of its own instance,
//! plain fields, reference fields, registrations, then sub-instance
//! exposures. Emission is all-or-nothing: operations and new bindings are
//! staged while the entry runs and only handed back once it completes. An
//! entry that hits an unbound identifier is abandoned and re-run from the
//! start after that identifier is bound.

use std::collections::HashMap;

use ecofan_core::{Identifier, KeyPath};
use ecofan_schema::{ActionCall, FieldValue, ValidatedNode};
use tracing::trace;

use crate::action::bind_action;
use crate::component::{Catalogue, ComponentDef, Construction};
use crate::error::{EmitError, Result};
use crate::op::{Arg, Init, OpValue, Operation};
use crate::registry::{InstanceHandle, InstanceRegistry, Origin, PendingHandle, Resolver, Step};

/// A validated entry ready for emission.
#[derive(Debug, Clone)]
pub struct Entry<'c> {
    /// Top-level domain the entry was written under.
    pub domain: String,
    pub def: &'c ComponentDef,
    pub config: ValidatedNode,
    /// The entry's own declared instance.
    pub own: PendingHandle,
    /// Identifiers assigned to the entry's action calls, by call path.
    pub action_ids: HashMap<KeyPath, Identifier>,
}

impl Entry<'_> {
    pub fn path(&self) -> &KeyPath {
        self.config.path()
    }

    pub fn id(&self) -> &Identifier {
        self.own.id()
    }

    /// Every identifier this entry binds when it completes.
    pub fn provides(&self) -> Vec<Identifier> {
        let mut out = vec![self.own.id().clone()];
        out.extend(self.config.exposures().into_iter().map(|(_, id, _, _)| id.clone()));
        out.extend(self.action_ids.values().cloned());
        out
    }
}

/// The staged result of a completed entry.
#[derive(Debug, Clone, Default)]
pub struct Emitted {
    pub ops: Vec<Operation>,
    /// Handles to bind, in the order they were created.
    pub handles: Vec<InstanceHandle>,
}

/// Emit one entry against the current registry.
pub fn emit_entry(
    registry: &InstanceRegistry,
    catalogue: &Catalogue,
    entry: &Entry<'_>,
) -> Result<Step<Emitted>> {
    let mut emitter = EntryEmitter {
        registry,
        catalogue,
        entry,
        staged: Vec::new(),
        ops: Vec::new(),
    };
    match emitter.run() {
        Ok(()) => Ok(Step::Ready(Emitted {
            ops: emitter.ops,
            handles: emitter.staged,
        })),
        Err(Halt::Suspend(id)) => Ok(Step::Suspended(id)),
        Err(Halt::Fail(err)) => Err(err),
    }
}

enum Halt {
    Suspend(Identifier),
    Fail(EmitError),
}

impl From<EmitError> for Halt {
    fn from(err: EmitError) -> Self {
        Halt::Fail(err)
    }
}

fn ready<T>(step: Step<T>) -> std::result::Result<T, Halt> {
    match step {
        Step::Ready(v) => Ok(v),
        Step::Suspended(id) => Err(Halt::Suspend(id)),
    }
}

/// Whether emitting `value` needs other instances.
fn is_wired(value: &FieldValue) -> bool {
    match value {
        FieldValue::Reference { .. } | FieldValue::Actions(_) => true,
        FieldValue::Object(node) => node.iter().any(|(_, v)| is_wired(v)),
        FieldValue::List(items) => items.iter().any(is_wired),
        FieldValue::Node(_)
        | FieldValue::Address(_)
        | FieldValue::Declare { .. }
        | FieldValue::Expose { .. } => false,
    }
}

struct EntryEmitter<'a, 'c> {
    registry: &'a InstanceRegistry,
    catalogue: &'a Catalogue,
    entry: &'a Entry<'c>,
    staged: Vec<InstanceHandle>,
    ops: Vec<Operation>,
}

impl Resolver for EntryEmitter<'_, '_> {
    fn resolve(&self, id: &Identifier, path: &KeyPath) -> Result<Step<InstanceHandle>> {
        match self.staged.iter().find(|h| &h.id == id) {
            Some(handle) => Ok(Step::Ready(handle.clone())),
            None => self.registry.resolve(id, path),
        }
    }

    fn class_of(&self, id: &Identifier) -> Option<&str> {
        self.registry.class_of(id)
    }

    fn default_for_class(&self, class: &str, path: &KeyPath) -> Result<Identifier> {
        self.registry.default_for_class(class, path)
    }
}

impl EntryEmitter<'_, '_> {
    fn push(&mut self, op: Operation) {
        trace!(op = %op, "emit");
        self.ops.push(op);
    }

    fn run(&mut self) -> std::result::Result<(), Halt> {
        let entry = self.entry;
        let def = entry.def;
        let config = &entry.config;
        let own = entry.own.id().clone();

        // 1. construction
        let (init, handle) = match def.construction() {
            Construction::New => (Init::New { args: vec![] }, entry.own.clone().constructed()),
            Construction::FromParent { field, accessor } => {
                let path = config.path().key(field);
                let Some(FieldValue::Reference { target, class }) = config.get(field) else {
                    return Err(EmitError::InvalidDocument {
                        path,
                        message: format!("`{field}` must reference the parent instance"),
                    }
                    .into());
                };
                let parent = ready(self.lookup(target, class, &path)?)?;
                (
                    Init::Exposed {
                        parent: parent.id.clone(),
                        accessor: accessor.clone(),
                    },
                    entry.own.clone().exposed(&parent, accessor.clone()),
                )
            }
        };
        self.push(Operation::Construct {
            id: own.clone(),
            class: entry.own.class().to_string(),
            init,
        });
        self.staged.push(handle);

        // 2. plain fields, 3. reference fields
        let settable: Vec<(&str, &FieldValue)> = config
            .iter()
            .filter(|(key, value)| {
                !matches!(value, FieldValue::Declare { .. } | FieldValue::Expose { .. })
                    && !def.consumes(key)
            })
            .collect();
        let (wired, plain): (Vec<_>, Vec<_>) = settable.into_iter().partition(|(_, v)| is_wired(v));
        for (key, value) in plain.into_iter().chain(wired) {
            let value = self.value(value, &config.path().key(key))?;
            self.push(Operation::SetField {
                id: own.clone(),
                field: key.to_string(),
                value,
            });
        }

        // 4. registrations
        for registration in def.registrations() {
            let mut args = Vec::new();
            for field in &registration.fields {
                if let Some(value) = config.get(field) {
                    args.push(Arg::new(
                        field.clone(),
                        self.value(value, &config.path().key(field))?,
                    ));
                }
            }
            self.push(Operation::Register {
                id: own.clone(),
                role: registration.role,
                args,
            });
        }

        // 5. exposures
        for (key, sub_id, class, accessor) in config.exposures() {
            let handle = ready(self.expose(&own, accessor, sub_id, &config.path().key(key))?)?;
            self.push(Operation::Expose {
                id: own.clone(),
                sub_id: sub_id.clone(),
                class: class.to_string(),
                accessor: accessor.to_string(),
            });
            self.staged.push(handle);
        }
        Ok(())
    }

    fn value(&mut self, value: &FieldValue, path: &KeyPath) -> std::result::Result<OpValue, Halt> {
        let converted = match value {
            FieldValue::Node(node) => OpValue::Node(node.clone()),
            FieldValue::Address(address) => OpValue::Literal(address.encode()),
            FieldValue::Declare { id, .. } | FieldValue::Expose { id, .. } => {
                OpValue::Instance(id.clone())
            }
            FieldValue::Reference { target, class } => {
                OpValue::Instance(ready(self.lookup(target, class, path)?)?.id)
            }
            FieldValue::Object(node) => {
                let mut args = Vec::with_capacity(node.len());
                for (key, field) in node.iter() {
                    args.push(Arg::new(key, self.value(field, &node.path().key(key))?));
                }
                OpValue::Object(args)
            }
            FieldValue::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    values.push(self.value(item, &path.index(i))?);
                }
                OpValue::List(values)
            }
            FieldValue::Actions(calls) => {
                let mut ids = Vec::with_capacity(calls.len());
                for call in calls {
                    ids.push(OpValue::Instance(self.action(call)?));
                }
                OpValue::List(ids)
            }
        };
        Ok(converted)
    }

    fn action(&mut self, call: &ActionCall) -> std::result::Result<Identifier, Halt> {
        let unknown = || EmitError::UnknownAction {
            name: call.name.clone(),
            path: call.config.path().clone(),
        };
        let id = self
            .entry
            .action_ids
            .get(call.config.path())
            .cloned()
            .ok_or_else(unknown)?;
        let def = self.catalogue.action(&call.name).ok_or_else(unknown)?;

        let op = ready(bind_action(&*self, &id, def, call)?)?;
        self.push(op);
        self.staged.push(InstanceHandle {
            id: id.clone(),
            class: def.class.clone(),
            origin: Origin::Constructed,
        });
        Ok(id)
    }
}
