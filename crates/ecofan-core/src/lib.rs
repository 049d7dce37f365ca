//! Core data model for ecofan.
//!
//! Holds the values every later stage passes around:
//! - [`ConfigNode`]: the decoded configuration tree
//! - [`KeyPath`]: where in the document a value lives
//! - [`Identifier`]: symbolic instance names
//! - [`RfAddress`]: the three-byte RF address and its literal encoding

pub mod address;
pub mod error;
pub mod id;
pub mod node;
pub mod path;

pub use address::{RfAddress, UintLiteral, ADDRESS_LEN};
pub use error::{CoreError, Result};
pub use id::{snake_case, Identifier};
pub use node::{ConfigNode, Mapping};
pub use path::{KeyPath, PathSegment};
