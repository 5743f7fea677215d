//! Resource graph nodes
//!
//! A [ResourceNode] pairs a resource model (anything implementing [Resource]) with what the user
//! declared about deploying it: an optional explicit name, [DeployOptions] and an optional
//! [Lookup].
use crate::name::{self, NamingError};
use crate::reference::dependency_name;
use crate::value::Properties;
use indexmap::IndexSet;
use std::sync::Arc;

/// Capabilities every resource kind exposes to the graph engine
///
/// The engine never looks at concrete kinds; expansion and projection are driven entirely
/// through this trait.
pub trait Resource: std::fmt::Debug + Send + Sync {
    /// CamelCase kind name, the source of [Resource::type_id]
    fn kind_name(&self) -> &str;

    fn type_id(&self) -> String {
        name::type_id(self.kind_name())
    }

    /// Natural key used to build the default name. Empty if the kind has none.
    fn key(&self) -> String {
        String::new()
    }

    /// Full dump of the model, before exclusions and renames
    fn properties(&self) -> Properties;

    fn excluded_fields(&self) -> &[&str] {
        &[]
    }

    /// `(field, backend_field)` pairs
    fn renamed_fields(&self) -> &[(&str, &str)] {
        &[]
    }

    /// Implicit child resources, given the resolved name of this resource
    fn additional_core_resources(&self, _resource_name: &str) -> Vec<ResourceNode> {
        vec![]
    }

    /// `false` for pure containers that only exist to own children
    fn self_as_core_resource(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lookup {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployOptions {
    /// Names (or `${resources.<name>}`) of resources that must be deployed first
    pub depends_on: IndexSet<String>,
    pub provider: Option<String>,
    pub aliases: Vec<String>,
    pub parent: Option<String>,
    pub ignore_changes: Vec<String>,
    pub replace_on_changes: Vec<String>,
    pub delete_before_replace: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            depends_on: Default::default(),
            provider: None,
            aliases: vec![],
            parent: None,
            ignore_changes: vec![],
            replace_on_changes: vec![],
            delete_before_replace: true,
        }
    }
}

impl DeployOptions {
    /// Normalized names of all declared dependencies
    pub fn dependencies(&self) -> impl Iterator<Item = String> + '_ {
        self.depends_on.iter().map(|entry| dependency_name(entry))
    }

    pub fn depends_on(&self, resource_name: &str) -> bool {
        self.dependencies().any(|name| name == resource_name)
    }

    /// Adds a dependency unless an equivalent entry exists
    ///
    /// Returns `true` if it was added.
    pub fn add_dependency(&mut self, resource_name: &str) -> bool {
        if self.depends_on(resource_name) {
            return false;
        }

        self.depends_on.insert(resource_name.to_string())
    }
}

/// A resource instance plus its deployment options
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub resource: Arc<dyn Resource>,
    /// Explicit name, overriding the key-derived one
    pub name: Option<String>,
    pub options: DeployOptions,
    pub lookup: Option<Lookup>,
}

impl ResourceNode {
    pub fn new(resource: impl Resource + 'static) -> Self {
        Self {
            resource: Arc::new(resource),
            name: None,
            options: Default::default(),
            lookup: None,
        }
    }

    /// A node that refers to a pre-existing resource instead of creating one
    pub fn existing(kind_name: impl Into<String>, lookup: Lookup) -> Self {
        let key = lookup.id.clone();
        Self::new(Existing {
            kind_name: kind_name.into(),
            key,
        })
        .with_lookup(lookup)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: DeployOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn type_id(&self) -> String {
        self.resource.type_id()
    }

    pub fn resource_name(&self) -> Result<String, NamingError> {
        name::resource_name(
            &self.resource.type_id(),
            &self.resource.key(),
            self.name.as_deref(),
        )
    }

    pub fn self_as_core_resource(&self) -> bool {
        self.resource.self_as_core_resource()
    }

    /// Children declared by the resource kind. Looked-up resources declare none.
    pub fn additional_core_resources(&self, resource_name: &str) -> Vec<ResourceNode> {
        if self.lookup.is_some() {
            return vec![];
        }

        self.resource.additional_core_resources(resource_name)
    }

    /// Property bag to submit to the backend, placeholders still unresolved
    ///
    /// Excluded fields are removed and renamed fields moved to their backend name. Looked-up
    /// resources have no properties.
    pub fn properties(&self) -> Properties {
        if self.lookup.is_some() {
            return Properties::new();
        }

        let excluded = self.resource.excluded_fields();
        let mut properties: Properties = self
            .resource
            .properties()
            .into_iter()
            .filter(|(field, _)| !excluded.contains(&field.as_str()))
            .collect();

        for (field, backend_field) in self.resource.renamed_fields() {
            let Some(index) = properties.get_index_of(*field) else {
                continue;
            };
            if let Some((_, value)) = properties.shift_remove_index(index) {
                properties.shift_insert(index, backend_field.to_string(), value);
            }
        }

        properties
    }
}

/// Placeholder model for looked-up resources
#[derive(Debug, Clone)]
struct Existing {
    kind_name: String,
    key: String,
}

impl Resource for Existing {
    fn kind_name(&self) -> &str {
        &self.kind_name
    }

    fn key(&self) -> String {
        self.key.clone()
    }

    fn properties(&self) -> Properties {
        Properties::new()
    }
}
