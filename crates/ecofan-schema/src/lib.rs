//! Schema-driven validation of configuration entries.
//!
//! A [`Schema`] lists the keys an entry may carry, how each raw value is
//! parsed, and which whole-object checks run once every field passed.
//! Schemas compose with [`Schema::extend`]; the [`Validator`] applies them
//! and collects every field error of an entry into one
//! [`ValidationReport`].

pub mod error;
pub mod parser;
pub mod schema;
pub mod validate;
pub mod value;

pub use error::{ErrorKind, ValidationError, ValidationReport};
pub use parser::{ActionSchemas, CustomParser, ValueParser, ID_KEY};
pub use schema::{FieldRule, ObjectCheck, Presence, Schema, UnknownKeys};
pub use validate::{validate, Validator};
pub use value::{ActionCall, FieldValue, IdRef, ReferenceSite, ValidatedNode};
