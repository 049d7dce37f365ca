//! Component definitions: a schema plus the plan for emitting its instance.

use std::collections::BTreeMap;

use ecofan_schema::{ActionSchemas, Schema};

use crate::op::Role;

/// The key platform entries are dispatched on.
pub const PLATFORM_KEY: &str = "platform";

/// How an entry's own instance is created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Construction {
    /// A fresh instance of the component class.
    #[default]
    New,
    /// The sub-instance returned by `accessor` on the instance referenced by `field`.
    FromParent { field: String, accessor: String },
}

/// A role the instance is registered in, and the fields passed as its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub role: Role,
    pub fields: Vec<String>,
}

impl Registration {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(role: Role, fields: &[&str]) -> Self {
        Self {
            role,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// A component (or platform) definition.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    name: String,
    class: String,
    schema: Schema,
    construction: Construction,
    registrations: Vec<Registration>,
    multi_conf: bool,
    dependencies: Vec<String>,
    platform_of: Option<String>,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, class: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            schema,
            construction: Construction::New,
            registrations: Vec::new(),
            multi_conf: false,
            dependencies: Vec::new(),
            platform_of: None,
        }
    }

    pub fn constructed(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    pub fn register(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Allow the domain to hold a sequence of entries.
    pub fn multi_conf(mut self) -> Self {
        self.multi_conf = true;
        self
    }

    pub fn depends_on(mut self, domain: impl Into<String>) -> Self {
        self.dependencies.push(domain.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn is_multi_conf(&self) -> bool {
        self.multi_conf
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// `fan.itho_ecofanrft` for platforms, the component name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.platform_of {
            Some(domain) => format!("{domain}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Whether `field` is consumed by dispatch, construction or a
    /// registration instead of being emitted as a `SetField`.
    pub fn consumes(&self, field: &str) -> bool {
        if self.platform_of.is_some() && field == PLATFORM_KEY {
            return true;
        }
        let by_construction =
            matches!(&self.construction, Construction::FromParent { field: f, .. } if f == field);
        by_construction
            || self
                .registrations
                .iter()
                .any(|r| r.fields.iter().any(|f| f == field))
    }
}

/// An action that operates on an existing instance.
#[derive(Debug, Clone)]
pub struct ActionDef {
    pub name: String,
    pub class: String,
    pub schema: Schema,
}

impl ActionDef {
    pub fn new(name: impl Into<String>, class: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            schema,
        }
    }
}

/// Every component, platform and action a document may use.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    components: BTreeMap<String, ComponentDef>,
    platforms: BTreeMap<(String, String), ComponentDef>,
    actions: BTreeMap<String, ActionDef>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, def: ComponentDef) {
        self.components.insert(def.name.clone(), def);
    }

    /// Add a platform of `domain`, e.g. the `itho_ecofanrft` platform of `fan`.
    pub fn add_platform(&mut self, domain: impl Into<String>, mut def: ComponentDef) {
        let domain = domain.into();
        def.platform_of = Some(domain.clone());
        self.platforms.insert((domain, def.name.clone()), def);
    }

    pub fn add_action(&mut self, def: ActionDef) {
        self.actions.insert(def.name.clone(), def);
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.get(name)
    }

    pub fn platform(&self, domain: &str, name: &str) -> Option<&ComponentDef> {
        self.platforms.get(&(domain.to_string(), name.to_string()))
    }

    pub fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.get(name)
    }

    /// Whether entries under `domain` dispatch on their `platform` key.
    pub fn is_platform_domain(&self, domain: &str) -> bool {
        self.platforms.keys().any(|(d, _)| d == domain)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentDef> {
        self.components.values()
    }

    /// Platforms with their domain.
    pub fn platforms(&self) -> impl Iterator<Item = (&str, &ComponentDef)> {
        self.platforms.iter().map(|((d, _), def)| (d.as_str(), def))
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDef> {
        self.actions.values()
    }

    /// Schemas of every registered action, for building action-list parsers.
    pub fn action_schemas(&self) -> ActionSchemas {
        let mut schemas = ActionSchemas::new();
        for action in self.actions.values() {
            schemas.register(action.name.clone(), action.schema.clone());
        }
        schemas
    }
}
