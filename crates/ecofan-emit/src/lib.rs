//! Dependency-ordered emission of construction operations.
//!
//! A document pass runs in two phases:
//! 1. every entry is validated against its component schema and every
//!    identifier it introduces is declared in the [`InstanceRegistry`];
//! 2. entries are emitted from a worklist. An entry that needs an instance
//!    a later entry constructs is suspended and resumed once that instance
//!    is bound, so the resulting [`Operation`] sequence never uses an
//!    identifier before its `Construct`.

pub mod action;
pub mod component;
pub mod emit;
pub mod error;
pub mod op;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod schedule;

pub use action::bind_action;
pub use component::{
    ActionDef, Catalogue, ComponentDef, Construction, Registration, PLATFORM_KEY,
};
pub use emit::{emit_entry, Emitted, Entry};
pub use error::{EmitError, Result};
pub use op::{Arg, Init, OpValue, Operation, Role};
pub use pipeline::{
    compile, declare_entries, validate_document, PassOptions, PassOutput, ValidatedEntry,
};
pub use registry::{InstanceHandle, InstanceRegistry, Origin, PendingHandle, Resolver, Step};
pub use report::{EmissionReport, OperationCounts};
pub use schedule::{schedule, Schedule};
