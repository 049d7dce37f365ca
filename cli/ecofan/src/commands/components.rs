//! `ecofan components`: list the built-in catalogue.

use std::fmt::Write;

use anyhow::Result;
use ecofan_components::builtin;
use ecofan_emit::{Catalogue, ComponentDef};
use ecofan_schema::{Presence, Schema};

pub fn run() -> Result<()> {
    print!("{}", describe(&builtin())?);
    Ok(())
}

/// Render every component, platform and action with its fields.
pub fn describe(catalogue: &Catalogue) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "Components:")?;
    for def in catalogue.components() {
        component_line(&mut out, def.name(), def)?;
    }

    writeln!(out, "\nPlatforms:")?;
    for (domain, def) in catalogue.platforms() {
        component_line(&mut out, &format!("{domain}.{}", def.name()), def)?;
    }

    writeln!(out, "\nActions:")?;
    for action in catalogue.actions() {
        writeln!(out, "  {:<24} {}", action.name, action.class)?;
        fields(&mut out, &action.schema)?;
    }
    Ok(out)
}

fn component_line(out: &mut String, name: &str, def: &ComponentDef) -> Result<()> {
    let mut notes = Vec::new();
    if def.is_multi_conf() {
        notes.push("multi".to_string());
    }
    if !def.dependencies().is_empty() {
        notes.push(format!("requires {}", def.dependencies().join(", ")));
    }
    let notes = if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join("; "))
    };
    writeln!(out, "  {name:<24} {}{notes}", def.class())?;
    fields(out, def.schema())
}

fn fields(out: &mut String, schema: &Schema) -> Result<()> {
    for rule in schema.fields() {
        let presence = match rule.presence {
            Presence::Required => "required",
            Presence::Optional { .. } => "optional",
            Presence::Generated => "generated",
        };
        writeln!(out, "      {:<20} {:<10} {}", rule.key, presence, rule.parser.name())?;
    }
    Ok(())
}
