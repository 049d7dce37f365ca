//! Document pass orchestrator.

use std::collections::{BTreeSet, HashMap};

use ecofan_core::{ConfigNode, Identifier, KeyPath};
use ecofan_schema::{UnknownKeys, ValidatedNode, ValidationError, ValidationReport, Validator};
use tracing::{debug, info};

use crate::component::{Catalogue, ComponentDef, PLATFORM_KEY};
use crate::emit::Entry;
use crate::error::{EmitError, Result};
use crate::op::Operation;
use crate::registry::{InstanceRegistry, Resolver};
use crate::report::{EmissionReport, OperationCounts};
use crate::schedule::schedule;

/// Configuration for one document pass.
#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Unknown-key policy forced onto every schema, if set.
    pub unknown_keys: Option<UnknownKeys>,
    /// Whether a component's dependency domains must be present.
    pub enforce_dependencies: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            unknown_keys: None,
            enforce_dependencies: true,
        }
    }
}

/// Output of a successful pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub operations: Vec<Operation>,
    pub report: EmissionReport,
}

/// An entry that passed its schema.
#[derive(Debug, Clone)]
pub struct ValidatedEntry<'c> {
    pub domain: String,
    pub def: &'c ComponentDef,
    pub config: ValidatedNode,
}

struct RawEntry<'c, 'd> {
    domain: &'d str,
    def: &'c ComponentDef,
    node: &'d ConfigNode,
    path: KeyPath,
}

/// Validate every entry of `document`, collecting all field errors.
pub fn validate_document<'c>(
    document: &ConfigNode,
    catalogue: &'c Catalogue,
    options: &PassOptions,
) -> Result<Vec<ValidatedEntry<'c>>> {
    let (raw, mut errors) = collect_entries(document, catalogue)?;
    if options.enforce_dependencies {
        check_dependencies(document, &raw)?;
    }

    let mut validator = Validator::new();
    if let Some(policy) = options.unknown_keys {
        validator = validator.with_unknown_keys(policy);
    }

    for entry in &raw {
        validator.reserve(entry.node, entry.def.schema());
    }

    let mut validated = Vec::with_capacity(raw.len());
    for entry in raw {
        match validator.validate(entry.node, entry.def.schema(), &entry.path) {
            Ok(config) => validated.push(ValidatedEntry {
                domain: entry.domain.to_string(),
                def: entry.def,
                config,
            }),
            Err(report) => errors.extend(report.errors),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationReport::new(errors).into());
    }
    debug!(entries = validated.len(), "validated document");
    Ok(validated)
}

/// Declare every identifier the entries introduce: own instances,
/// exposed sub-instances and action instances.
///
/// Action identifiers are assigned last, skipping any name the document
/// already uses.
pub fn declare_entries<'c>(
    entries: Vec<ValidatedEntry<'c>>,
    catalogue: &Catalogue,
    registry: &mut InstanceRegistry,
) -> Result<Vec<Entry<'c>>> {
    let mut owned = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.config.path().clone();
        let Some((key, id, class)) = entry.config.declared() else {
            return Err(EmitError::InvalidDocument {
                path,
                message: format!("{} entry declares no identifier", entry.def.name()),
            });
        };
        let own = registry.declare(id.clone(), class, &path.key(key))?;

        for (key, sub_id, class, _) in entry.config.exposures() {
            registry.declare(sub_id.clone(), class, &path.key(key))?;
        }
        owned.push((entry, own));
    }

    let mut declared = Vec::with_capacity(owned.len());
    for (entry, own) in owned {
        let mut action_ids = HashMap::new();
        let mut n = 0;
        for call in entry.config.action_calls() {
            let def = catalogue
                .action(&call.name)
                .ok_or_else(|| EmitError::UnknownAction {
                    name: call.name.clone(),
                    path: call.config.path().clone(),
                })?;
            let action_id = loop {
                let name = format!("{}_action_{n}", own.id());
                n += 1;
                let candidate =
                    Identifier::new(name).map_err(|e| EmitError::InvalidDocument {
                        path: call.config.path().clone(),
                        message: e.to_string(),
                    })?;
                if !registry.is_declared(&candidate) {
                    break candidate;
                }
            };
            registry.declare(action_id.clone(), def.class.clone(), call.config.path())?;
            action_ids.insert(call.config.path().clone(), action_id);
        }

        declared.push(Entry {
            domain: entry.domain,
            def: entry.def,
            config: entry.config,
            own,
            action_ids,
        });
    }

    // every reference must name a declared instance of the right class
    for entry in &declared {
        for site in entry.config.references() {
            registry.target_of(site.target, site.class, &site.path)?;
        }
    }
    Ok(declared)
}

/// Run a full pass: validate, declare, then emit in dependency order.
pub fn compile(
    document: &ConfigNode,
    catalogue: &Catalogue,
    options: &PassOptions,
) -> Result<PassOutput> {
    let validated = validate_document(document, catalogue, options)?;
    let entry_count = validated.len();

    let mut registry = InstanceRegistry::new();
    let entries = declare_entries(validated, catalogue, &mut registry)?;
    let scheduled = schedule(&entries, catalogue, &mut registry)?;

    let report = EmissionReport {
        entries: entry_count,
        identifiers: registry.len(),
        operations: OperationCounts::tally(&scheduled.operations),
        suspensions: scheduled.suspensions,
    };
    info!(
        entries = report.entries,
        operations = scheduled.operations.len(),
        suspensions = report.suspensions,
        "compiled document"
    );
    Ok(PassOutput {
        operations: scheduled.operations,
        report,
    })
}

fn collect_entries<'c, 'd>(
    document: &'d ConfigNode,
    catalogue: &'c Catalogue,
) -> Result<(Vec<RawEntry<'c, 'd>>, Vec<ValidationError>)> {
    let root = KeyPath::root();
    let Some(domains) = document.as_mapping() else {
        return Err(EmitError::InvalidDocument {
            path: root,
            message: format!("expected a mapping of components, found {}", document.kind_name()),
        });
    };

    let mut raw = Vec::new();
    let mut errors = Vec::new();
    for (domain, value) in domains.iter() {
        let domain_path = root.key(domain);
        let items: Vec<(KeyPath, &ConfigNode)> = match value {
            ConfigNode::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (domain_path.index(i), item))
                .collect(),
            single => vec![(domain_path.clone(), single)],
        };

        if catalogue.is_platform_domain(domain) {
            for (path, node) in items {
                match platform_name(node, &path) {
                    Ok(platform) => {
                        let def = catalogue.platform(domain, platform).ok_or_else(|| {
                            EmitError::UnknownPlatform {
                                domain: domain.to_string(),
                                platform: platform.to_string(),
                                path: path.key(PLATFORM_KEY),
                            }
                        })?;
                        raw.push(RawEntry {
                            domain,
                            def,
                            node,
                            path,
                        });
                    }
                    Err(err) => errors.push(err),
                }
            }
            continue;
        }

        let def = catalogue
            .component(domain)
            .ok_or_else(|| EmitError::UnknownComponent {
                domain: domain.to_string(),
                path: domain_path.clone(),
            })?;
        if value.as_sequence().is_some() && !def.is_multi_conf() {
            return Err(EmitError::MultipleEntries {
                domain: domain.to_string(),
                path: domain_path,
            });
        }
        raw.extend(items.into_iter().map(|(path, node)| RawEntry {
            domain,
            def,
            node,
            path,
        }));
    }
    Ok((raw, errors))
}

fn platform_name<'d>(node: &'d ConfigNode, path: &KeyPath) -> std::result::Result<&'d str, ValidationError> {
    let Some(mapping) = node.as_mapping() else {
        return Err(ValidationError::invalid(
            path.clone(),
            format!("expected a mapping, found {}", node.kind_name()),
        ));
    };
    match mapping.get(PLATFORM_KEY) {
        Some(ConfigNode::String(name)) => Ok(name),
        Some(other) => Err(ValidationError::invalid(
            path.key(PLATFORM_KEY),
            format!("expected a string, found {}", other.kind_name()),
        )),
        None => Err(ValidationError::missing(path.key(PLATFORM_KEY))),
    }
}

fn check_dependencies(document: &ConfigNode, raw: &[RawEntry<'_, '_>]) -> Result<()> {
    let present: BTreeSet<&str> = document
        .as_mapping()
        .map(|m| m.keys().collect())
        .unwrap_or_default();
    for entry in raw {
        for requires in entry.def.dependencies() {
            if !present.contains(requires.as_str()) {
                return Err(EmitError::MissingDependency {
                    domain: entry.def.qualified_name(),
                    requires: requires.clone(),
                    path: entry.path.clone(),
                });
            }
        }
    }
    Ok(())
}
