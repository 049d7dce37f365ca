//! Scripts: named action lists.

use std::sync::Arc;

use ecofan_emit::{ComponentDef, Registration, Role};
use ecofan_schema::{ActionSchemas, Schema, ValueParser, ID_KEY};

pub const DOMAIN: &str = "script";
pub const CLASS: &str = "Script";
pub const THEN_KEY: &str = "then";

/// A script accepting the given actions in its `then` list.
pub fn definition(actions: ActionSchemas) -> ComponentDef {
    let schema = Schema::new()
        .required(ID_KEY, ValueParser::declare_id(CLASS))
        .required(THEN_KEY, ValueParser::Actions(Arc::new(actions)));
    ComponentDef::new(DOMAIN, CLASS, schema)
        .register(Registration::new(Role::Script))
        .multi_conf()
}
