//! Identifier to instance mapping for one document pass.

use std::collections::HashMap;

use ecofan_core::{Identifier, KeyPath};
use ecofan_schema::IdRef;
use serde::Serialize;
use tracing::debug;

use crate::error::{EmitError, Result};

/// Where a bound instance came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    Constructed,
    /// Handed out by `parent` through `accessor`.
    Exposed { parent: Identifier, accessor: String },
}

/// A constructed (or exposed) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceHandle {
    pub id: Identifier,
    pub class: String,
    pub origin: Origin,
}

/// A declared identifier that has not been bound yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandle {
    id: Identifier,
    class: String,
}

impl PendingHandle {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// The handle for a freshly constructed instance.
    pub fn constructed(self) -> InstanceHandle {
        InstanceHandle {
            id: self.id,
            class: self.class,
            origin: Origin::Constructed,
        }
    }

    /// The handle for the sub-instance `parent` exposes through `accessor`.
    pub fn exposed(self, parent: &InstanceHandle, accessor: impl Into<String>) -> InstanceHandle {
        InstanceHandle {
            id: self.id,
            class: self.class,
            origin: Origin::Exposed {
                parent: parent.id.clone(),
                accessor: accessor.into(),
            },
        }
    }
}

/// The result of reading something that may not be available yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Ready(T),
    /// Blocked until the identifier is bound.
    Suspended(Identifier),
}

impl<T> Step<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Step<U> {
        match self {
            Step::Ready(v) => Step::Ready(f(v)),
            Step::Suspended(id) => Step::Suspended(id),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Step::Ready(_))
    }
}

/// Read access to declared and bound instances.
///
/// Implemented by the registry itself and by the staging overlay an entry
/// emits through, so lookups see the entry's own not-yet-committed handles.
pub trait Resolver {
    /// The bound handle for `id`, or a suspension if it is declared but unbound.
    fn resolve(&self, id: &Identifier, path: &KeyPath) -> Result<Step<InstanceHandle>>;

    /// The class `id` was declared with.
    fn class_of(&self, id: &Identifier) -> Option<&str>;

    /// The single declared identifier of `class`.
    fn default_for_class(&self, class: &str, path: &KeyPath) -> Result<Identifier>;

    /// Turn a reference into a declared identifier of the expected class.
    fn target_of(&self, target: &IdRef, class: &str, path: &KeyPath) -> Result<Identifier> {
        let id = match target {
            IdRef::Named(id) => id.clone(),
            IdRef::DefaultOf(default_class) => self.default_for_class(default_class, path)?,
        };
        match self.class_of(&id) {
            Some(found) if found != class => Err(EmitError::ClassMismatch {
                id,
                path: path.clone(),
                expected: class.to_string(),
                found: found.to_string(),
            }),
            Some(_) => Ok(id),
            None => Err(EmitError::UnknownIdentifier {
                id,
                path: path.clone(),
            }),
        }
    }

    /// Resolve a reference of the expected class.
    fn lookup(&self, target: &IdRef, class: &str, path: &KeyPath) -> Result<Step<InstanceHandle>> {
        let id = self.target_of(target, class, path)?;
        self.resolve(&id, path)
    }

    /// The handle of the sub-instance `parent` exposes through `accessor`,
    /// to be bound under the already declared `sub_id`.
    fn expose(
        &self,
        parent: &Identifier,
        accessor: &str,
        sub_id: &Identifier,
        path: &KeyPath,
    ) -> Result<Step<InstanceHandle>> {
        let class = self
            .class_of(sub_id)
            .ok_or_else(|| EmitError::UnknownIdentifier {
                id: sub_id.clone(),
                path: path.clone(),
            })?
            .to_string();
        let pending = PendingHandle {
            id: sub_id.clone(),
            class,
        };
        Ok(self
            .resolve(parent, path)?
            .map(|parent| pending.exposed(&parent, accessor)))
    }
}

#[derive(Debug)]
struct Slot {
    class: String,
    declared_at: KeyPath,
    binding: Option<InstanceHandle>,
}

/// Every identifier declared in one document, and what it is bound to.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    slots: HashMap<Identifier, Slot>,
    order: Vec<Identifier>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `id` as an instance of `class`, written at `path`.
    pub fn declare(
        &mut self,
        id: Identifier,
        class: impl Into<String>,
        path: &KeyPath,
    ) -> Result<PendingHandle> {
        if let Some(slot) = self.slots.get(&id) {
            return Err(EmitError::DuplicateIdentifier {
                id,
                path: path.clone(),
                first: slot.declared_at.clone(),
            });
        }
        let class = class.into();
        debug!(id = %id, class = %class, path = %path, "declared identifier");
        self.slots.insert(
            id.clone(),
            Slot {
                class: class.clone(),
                declared_at: path.clone(),
                binding: None,
            },
        );
        self.order.push(id.clone());
        Ok(PendingHandle { id, class })
    }

    /// Bind a declared identifier to its instance. Each identifier binds once.
    pub fn bind(&mut self, handle: InstanceHandle) -> Result<()> {
        let Some(slot) = self.slots.get_mut(&handle.id) else {
            return Err(EmitError::UnknownIdentifier {
                id: handle.id,
                path: KeyPath::root(),
            });
        };
        if slot.binding.is_some() {
            return Err(EmitError::Rebind { id: handle.id });
        }
        debug!(id = %handle.id, "bound identifier");
        slot.binding = Some(handle);
        Ok(())
    }

    pub fn is_declared(&self, id: &Identifier) -> bool {
        self.slots.contains_key(id)
    }

    pub fn is_bound(&self, id: &Identifier) -> bool {
        self.slots.get(id).is_some_and(|s| s.binding.is_some())
    }

    /// Where `id` was declared.
    pub fn declared_at(&self, id: &Identifier) -> Option<&KeyPath> {
        self.slots.get(id).map(|s| &s.declared_at)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of identifiers that are declared but still unbound.
    pub fn unbound_count(&self) -> usize {
        self.slots.values().filter(|s| s.binding.is_none()).count()
    }
}

impl Resolver for InstanceRegistry {
    fn resolve(&self, id: &Identifier, path: &KeyPath) -> Result<Step<InstanceHandle>> {
        match self.slots.get(id) {
            Some(Slot {
                binding: Some(handle),
                ..
            }) => Ok(Step::Ready(handle.clone())),
            Some(_) => Ok(Step::Suspended(id.clone())),
            None => Err(EmitError::UnknownIdentifier {
                id: id.clone(),
                path: path.clone(),
            }),
        }
    }

    fn class_of(&self, id: &Identifier) -> Option<&str> {
        self.slots.get(id).map(|s| s.class.as_str())
    }

    fn default_for_class(&self, class: &str, path: &KeyPath) -> Result<Identifier> {
        let candidates: Vec<Identifier> = self
            .order
            .iter()
            .filter(|id| self.class_of(id) == Some(class))
            .cloned()
            .collect();
        match candidates.as_slice() {
            [] => Err(EmitError::NoDefaultInstance {
                class: class.to_string(),
                path: path.clone(),
            }),
            [only] => Ok(only.clone()),
            _ => Err(EmitError::AmbiguousDefault {
                class: class.to_string(),
                path: path.clone(),
                candidates,
            }),
        }
    }
}
