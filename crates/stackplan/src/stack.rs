//! Stack configuration
//!
//! A stack document declares variables and resources:
//!
//! ```yaml
//! name: analytics
//! variables:
//!   env: dev
//! resources:
//!   warehouses:
//!     - name: default
//!       cluster_size: 2X-Small
//!       options:
//!         provider: workspace-${vars.env}
//!   users:
//!     - user_name: jane@example.com
//!   workspace_files:
//!     - source: ./workspacefiles/init.py
//!   permissions:
//!     - resource_name: shared-permissions
//!       access_controls: [{ group_name: users, permission_level: CAN_READ }]
//!       directory_path: /shared
//! ```
//!
//! Besides its kind-specific fields every resource entry accepts
//! - `resource_name`: explicit name
//! - `options`: [DeployOptions]
//! - `lookup`: `{ id: ... }` to use an existing resource. All other fields are then ignored.
use crate::documents::{Source, StackDocuments};
use crate::node::{DeployOptions, Lookup, ResourceNode};
use crate::plan::{Plan, PlanError};
use crate::reference::Variables;
use crate::resources::{Kind, Permissions, SqlWarehouse, User, WorkspaceFile};

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesConfig {
    pub warehouses: Vec<Declared>,
    pub workspace_files: Vec<Declared>,
    pub users: Vec<Declared>,
    pub permissions: Vec<Declared>,
}

/// A resource entry, before its kind-specific fields are validated
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Declared {
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub options: DeployOptions,
    #[serde(default)]
    pub lookup: Option<Lookup>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Declared {
    fn to_node<K: Kind>(&self) -> Result<ResourceNode, serde_json::Error> {
        let node = match &self.lookup {
            Some(lookup) => ResourceNode::existing(K::KIND_NAME, lookup.clone()),
            None => {
                let resource: K =
                    serde_json::from_value(serde_json::Value::Object(self.fields.clone()))?;
                ResourceNode::new(resource)
            }
        };

        let node = node.with_options(self.options.clone());
        Ok(match &self.resource_name {
            Some(name) => node.with_name(name.clone()),
            None => node,
        })
    }
}

/// All declared resources and variables of one or more stack documents
#[derive(Debug, Clone, Default)]
pub struct Stack {
    pub name: Option<String>,
    pub variables: Variables,
    pub resources: Vec<ResourceNode>,
}

impl Stack {
    /// Merges documents in load order
    ///
    /// The first name wins, later variables override earlier ones and resources are appended.
    pub fn new(documents: &StackDocuments) -> Result<Self, StackError> {
        let mut stack = Stack::default();

        for (_index, source, config) in documents.stacks() {
            if stack.name.is_none() {
                stack.name.clone_from(&config.name);
            }

            for (key, value) in &config.variables {
                if stack.variables.insert(key.clone(), value.clone()).is_some() {
                    tracing::debug!(variable = %key, "variable overridden");
                }
            }

            let resources = &config.resources;
            stack.add::<SqlWarehouse>(source, "warehouses", &resources.warehouses)?;
            stack.add::<WorkspaceFile>(source, "workspace_files", &resources.workspace_files)?;
            stack.add::<User>(source, "users", &resources.users)?;
            stack.add::<Permissions>(source, "permissions", &resources.permissions)?;
        }

        Ok(stack)
    }

    fn add<K: Kind>(
        &mut self,
        source: &Source,
        section: &'static str,
        entries: &[Declared],
    ) -> Result<(), StackError> {
        for (index, declared) in entries.iter().enumerate() {
            let node = declared
                .to_node::<K>()
                .map_err(|error| StackError::InvalidResource {
                    origin: origin(source),
                    section,
                    index,
                    source: error,
                })?;
            tracing::trace!(section, index, "declared resource");
            self.resources.push(node);
        }

        Ok(())
    }

    pub fn plan(&self) -> Result<Plan, PlanError> {
        Plan::from_roots(&self.resources)
    }

    /// Stack variables with `overrides` applied on top
    pub fn variables_with(&self, overrides: &Variables) -> Variables {
        let mut variables = self.variables.clone();
        variables.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        variables
    }
}

fn origin(source: &Source) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StackError {
    #[error("invalid entry {index} of `resources.{section}` in {origin}")]
    InvalidResource {
        origin: String,
        section: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}
