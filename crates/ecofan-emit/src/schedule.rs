//! Worklist scheduling of entries in dependency order.
//!
//! Entries run in document order. An entry that reads an unbound identifier
//! is parked on it and moved to the front of the queue once it is bound, so
//! it runs before the remaining document-order entries. When the queue is
//! empty but entries are still parked, the waits-for relation contains a
//! cycle, which is reported.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use ecofan_core::Identifier;
use tracing::{debug, trace};

use crate::component::Catalogue;
use crate::emit::{emit_entry, Entry};
use crate::error::{EmitError, Result};
use crate::op::Operation;
use crate::registry::{InstanceRegistry, Step};

/// The ordered operations of a completed schedule.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub operations: Vec<Operation>,
    /// Entry indices in the order they completed.
    pub completion_order: Vec<usize>,
    /// How many times an entry was parked.
    pub suspensions: usize,
}

/// Run every entry to completion against `registry`.
pub fn schedule(
    entries: &[Entry<'_>],
    catalogue: &Catalogue,
    registry: &mut InstanceRegistry,
) -> Result<Schedule> {
    let producers: HashMap<Identifier, usize> = entries
        .iter()
        .enumerate()
        .flat_map(|(i, e)| e.provides().into_iter().map(move |id| (id, i)))
        .collect();

    let mut queue: VecDeque<usize> = (0..entries.len()).collect();
    let mut parked: HashMap<Identifier, Vec<usize>> = HashMap::new();
    let mut waiting: BTreeMap<usize, Identifier> = BTreeMap::new();
    let mut out = Schedule::default();

    while let Some(index) = queue.pop_front() {
        let entry = &entries[index];
        match emit_entry(registry, catalogue, entry)? {
            Step::Suspended(id) => {
                debug!(entry = %entry.path(), waits_for = %id, "suspended entry");
                out.suspensions += 1;
                parked.entry(id.clone()).or_default().push(index);
                waiting.insert(index, id);
            }
            Step::Ready(emitted) => {
                trace!(entry = %entry.path(), ops = emitted.ops.len(), "completed entry");
                out.operations.extend(emitted.ops);
                out.completion_order.push(index);

                let mut woken = Vec::new();
                for handle in emitted.handles {
                    if let Some(waiters) = parked.remove(&handle.id) {
                        woken.extend(waiters);
                    }
                    registry.bind(handle)?;
                }
                woken.sort_unstable();
                for &w in woken.iter().rev() {
                    waiting.remove(&w);
                    queue.push_front(w);
                }
                if !woken.is_empty() {
                    debug!(entry = %entry.path(), resumed = woken.len(), "resumed entries");
                }
            }
        }
    }

    if let Some(cycle) = find_cycle(&waiting, &producers) {
        let cycle = cycle
            .into_iter()
            .map(|id| {
                let path = registry.declared_at(&id).cloned().unwrap_or_default();
                (id, path)
            })
            .collect();
        return Err(EmitError::CyclicDependency { cycle });
    }
    Ok(out)
}

/// Follow waits-for edges (entry waits on identifier, identifier is produced
/// by entry) from the lowest parked entry until an entry repeats.
fn find_cycle(
    waiting: &BTreeMap<usize, Identifier>,
    producers: &HashMap<Identifier, usize>,
) -> Option<Vec<Identifier>> {
    let (&start, _) = waiting.iter().next()?;
    let mut chain: Vec<(usize, Identifier)> = Vec::new();
    let mut seen = HashSet::new();
    let mut current = start;

    loop {
        if !seen.insert(current) {
            let from = chain.iter().position(|(e, _)| *e == current).unwrap_or(0);
            return Some(chain.into_iter().skip(from).map(|(_, id)| id).collect());
        }
        let Some(id) = waiting.get(&current) else {
            // the chain ends at an entry that is not parked
            return Some(chain.into_iter().map(|(_, id)| id).collect());
        };
        chain.push((current, id.clone()));
        match producers.get(id) {
            Some(&next) => current = next,
            None => return Some(chain.into_iter().map(|(_, id)| id).collect()),
        }
    }
}
