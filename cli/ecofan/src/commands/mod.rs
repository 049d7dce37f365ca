//! CLI command implementations.

pub mod components;
pub mod emit;
pub mod validate;
