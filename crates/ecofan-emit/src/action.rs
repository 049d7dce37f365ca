//! Binding actions to the instance they operate on.

use ecofan_core::Identifier;
use ecofan_schema::{ActionCall, FieldValue, ID_KEY};
use tracing::trace;

use crate::component::ActionDef;
use crate::error::{EmitError, Result};
use crate::op::{Init, OpValue, Operation};
use crate::registry::{Resolver, Step};

/// Emit the construction of action `action_id` over the instance `call` refers to.
///
/// Suspends while the referenced instance is declared but not yet bound.
pub fn bind_action<R: Resolver + ?Sized>(
    resolver: &R,
    action_id: &Identifier,
    def: &ActionDef,
    call: &ActionCall,
) -> Result<Step<Operation>> {
    let path = call.config.path().key(ID_KEY);
    let Some(FieldValue::Reference { target, class }) = call.config.get(ID_KEY) else {
        return Err(EmitError::InvalidDocument {
            path,
            message: format!("action '{}' does not reference an instance", def.name),
        });
    };

    let step = resolver.lookup(target, class, &path)?.map(|parent| {
        trace!(action = %action_id, parent = %parent.id, "bound action");
        Operation::Construct {
            id: action_id.clone(),
            class: def.class.clone(),
            init: Init::New {
                args: vec![OpValue::Instance(parent.id)],
            },
        }
    });
    Ok(step)
}
